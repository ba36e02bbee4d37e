use super::common::{check_bounds, mismatch};
use super::{Input, TypeDef};
use crate::resolve::ResolutionContext;
use crate::schema::{MemberDef, TypeName};
use crate::{Error, ErrorCode, Number, Result, Value};
use num_bigint::BigInt;
use std::str::FromStr;

pub struct BigIntDef;

impl TypeDef for BigIntDef {
    fn name(&self) -> TypeName {
        TypeName::BigInt
    }

    fn validate(
        &self,
        input: Input<'_>,
        def: &MemberDef,
        _ctx: &mut ResolutionContext<'_>,
    ) -> Result<Value> {
        let b = to_bigint(&input).ok_or_else(|| mismatch("a big integer", &input, def))?;

        check_bounds(def, &input, &b, |bound| Some(b.cmp(&bound_bigint(bound)?)))?;

        if let Some(m) = def.multiple_of.as_ref().and_then(bound_bigint) {
            let zero = BigInt::from(0u8);
            if m != zero && &b % &m != zero {
                return Err(Error::validation(
                    ErrorCode::NotMultipleOf,
                    format!("{} is not a multiple of {} for '{}'", b, m, def.path),
                    input.range(),
                ));
            }
        }

        Ok(Value::BigInt(b))
    }
}

/// Integers too large for `i64` tokenize as floats, so tokens are re-read
/// from their lexeme.
fn to_bigint(input: &Input<'_>) -> Option<BigInt> {
    match input.scalar()? {
        (Value::BigInt(b), _) => Some(b.clone()),
        (Value::Number(Number::Integer(i)), _) => Some(BigInt::from(*i)),
        (Value::Number(Number::Float(_)), Some(raw)) => BigInt::from_str(raw).ok(),
        (Value::String(s), _) => BigInt::from_str(s.trim().trim_end_matches('n')).ok(),
        _ => None,
    }
}

fn bound_bigint(bound: &Value) -> Option<BigInt> {
    match bound {
        Value::BigInt(b) => Some(b.clone()),
        Value::Number(Number::Integer(i)) => Some(BigInt::from(*i)),
        _ => None,
    }
}
