use super::common::{check_bounds, mismatch};
use super::{Input, TypeDef};
use crate::resolve::ResolutionContext;
use crate::schema::{MemberDef, TypeName};
use crate::{Error, ErrorCode, Number, Result, Value};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// `number` and the sized integer family.
pub struct NumberDef {
    name: TypeName,
}

impl NumberDef {
    pub fn new(name: TypeName) -> Self {
        NumberDef { name }
    }

    fn validate_float(&self, n: &Number, input: &Input<'_>, def: &MemberDef) -> Result<Value> {
        let x = n.as_f64();
        check_bounds(def, input, n, |bound| x.partial_cmp(&bound_f64(bound)?))?;

        if let Some(m) = def.multiple_of.as_ref().and_then(bound_f64) {
            if m != 0.0 && x.is_finite() {
                let q = x / m;
                if (q - q.round()).abs() > 1e-9 {
                    return Err(not_multiple(n, def, input));
                }
            }
        }
        Ok(Value::Number(n.clone()))
    }

    fn validate_integer(
        &self,
        n: &Number,
        (lo, hi): (i64, i64),
        input: &Input<'_>,
        def: &MemberDef,
    ) -> Result<Value> {
        let Some(i) = n.as_i64() else {
            return Err(mismatch("an integer", input, def));
        };
        if i < lo || i > hi {
            return Err(Error::validation(
                ErrorCode::OutOfRange,
                format!("{} is outside the range of {} for '{}'", i, self.name, def.path),
                input.range(),
            ));
        }

        check_bounds(def, input, &i, |bound| compare_int(i, bound))?;

        if let Some(Value::Number(Number::Integer(m))) = &def.multiple_of {
            if !is_multiple(i, *m) {
                return Err(not_multiple(n, def, input));
            }
        }
        Ok(Value::Number(Number::Integer(i)))
    }
}

impl TypeDef for NumberDef {
    fn name(&self) -> TypeName {
        self.name
    }

    fn validate(
        &self,
        input: Input<'_>,
        def: &MemberDef,
        _ctx: &mut ResolutionContext<'_>,
    ) -> Result<Value> {
        let Some((Value::Number(n), _)) = input.scalar() else {
            let expected = if self.name == TypeName::Number {
                "a number"
            } else {
                "an integer"
            };
            return Err(mismatch(expected, &input, def));
        };
        match self.name.integer_bounds() {
            Some(bounds) => self.validate_integer(n, bounds, &input, def),
            None => self.validate_float(n, &input, def),
        }
    }
}

fn bound_f64(bound: &Value) -> Option<f64> {
    match bound {
        Value::Number(n) => Some(n.as_f64()),
        Value::Decimal(d) => d.to_string().parse().ok(),
        Value::BigInt(b) => b.to_string().parse().ok(),
        _ => None,
    }
}

fn compare_int(i: i64, bound: &Value) -> Option<Ordering> {
    match bound {
        Value::Number(Number::Integer(b)) => Some(i.cmp(b)),
        Value::Number(n) => (i as f64).partial_cmp(&n.as_f64()),
        Value::Decimal(d) => Some(Decimal::from(i).cmp(d)),
        Value::BigInt(b) => Some(BigInt::from(i).cmp(b)),
        _ => None,
    }
}

fn not_multiple(n: &Number, def: &MemberDef, input: &Input<'_>) -> Error {
    let m = def
        .multiple_of
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    Error::validation(
        ErrorCode::NotMultipleOf,
        format!("{} is not a multiple of {} for '{}'", n, m, def.path),
        input.range(),
    )
}

/// `0` constrains nothing; `checked_rem` only fails for `i64::MIN % -1`,
/// which is a multiple.
fn is_multiple(i: i64, m: i64) -> bool {
    m == 0 || i.checked_rem(m).map_or(true, |r| r == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_int_across_kinds() {
        assert_eq!(compare_int(5, &Value::from(10)), Some(Ordering::Less));
        assert_eq!(compare_int(5, &Value::from(4.5)), Some(Ordering::Greater));
        assert_eq!(
            compare_int(5, &Value::Decimal(Decimal::new(500, 2))),
            Some(Ordering::Equal)
        );
        assert_eq!(compare_int(5, &Value::from("5")), None);
    }

    #[test]
    fn test_is_multiple_edges() {
        assert!(is_multiple(i64::MIN, -1));
        assert!(is_multiple(i64::MIN, 2));
        assert!(is_multiple(7, 0));
        assert!(is_multiple(-15, 5));
        assert!(!is_multiple(i64::MAX, 2));
    }
}
