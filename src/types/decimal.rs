//! `decimal`, with four precision/scale modes:
//!
//! | constraints          | rule                                                   |
//! |----------------------|--------------------------------------------------------|
//! | neither              | any decimal                                            |
//! | `scale` only         | exactly `scale` fractional digits                      |
//! | `precision` only     | at most `precision` significant digits                 |
//! | both                 | exact scale, at most `precision - scale` integer digits |
//!
//! Significant digits are the integer digits (none for `|v| < 1`) plus the
//! scale. `min`, `max` and `multipleOf` compare numerically in every mode, so
//! `50.00` equals `50`.
//!
//! Values are `rust_decimal::Decimal`, whose mantissa holds 28 digits, so
//! `precision` and `scale` above 28 are rejected with `invalidConstraint`
//! when the schema compiles. The limit belongs to this implementation, not
//! to the format.

use super::common::{check_bounds, mismatch};
use super::{Input, TypeDef};
use crate::resolve::ResolutionContext;
use crate::schema::{MemberDef, TypeName};
use crate::tokenizer::parse_decimal;
use crate::{Error, ErrorCode, Number, Result, Value};
use rust_decimal::Decimal;

pub struct DecimalDef;

impl TypeDef for DecimalDef {
    fn name(&self) -> TypeName {
        TypeName::Decimal
    }

    fn validate(
        &self,
        input: Input<'_>,
        def: &MemberDef,
        _ctx: &mut ResolutionContext<'_>,
    ) -> Result<Value> {
        let d = to_decimal(&input).ok_or_else(|| mismatch("a decimal", &input, def))?;

        match (def.precision, def.scale) {
            (None, None) => {}
            (None, Some(scale)) => check_scale(&d, scale, &input, def)?,
            (Some(precision), None) => {
                let digits = significant_digits(&d);
                if digits > precision {
                    return Err(Error::validation(
                        ErrorCode::InvalidPrecision,
                        format!(
                            "{} has {} significant digits, '{}' allows at most {}",
                            d, digits, def.path, precision
                        ),
                        input.range(),
                    ));
                }
            }
            (Some(precision), Some(scale)) => {
                check_scale(&d, scale, &input, def)?;
                let allowed = precision.saturating_sub(scale);
                let digits = integer_digits(&d);
                if digits > allowed {
                    return Err(Error::validation(
                        ErrorCode::InvalidPrecision,
                        format!(
                            "{} has {} integer digits, '{}' allows at most {}",
                            d, digits, def.path, allowed
                        ),
                        input.range(),
                    ));
                }
            }
        }

        check_bounds(def, &input, &d, |bound| Some(d.cmp(&bound_decimal(bound)?)))?;

        if let Some(m) = def.multiple_of.as_ref().and_then(bound_decimal) {
            if d.checked_rem(m).map_or(false, |r| !r.is_zero()) {
                return Err(Error::validation(
                    ErrorCode::NotMultipleOf,
                    format!("{} is not a multiple of {} for '{}'", d, m, def.path),
                    input.range(),
                ));
            }
        }

        Ok(Value::Decimal(d))
    }

    fn stringify(
        &self,
        value: &Value,
        def: &MemberDef,
        _ctx: &mut ResolutionContext<'_>,
    ) -> Result<String> {
        match (value, def.scale) {
            (Value::Decimal(d), Some(scale)) if d.scale() != scale => {
                let mut d = *d;
                d.rescale(scale);
                Ok(format!("{}m", d))
            }
            _ => Ok(value.to_string()),
        }
    }
}

/// Number tokens are re-read from their lexeme so the written scale survives.
fn to_decimal(input: &Input<'_>) -> Option<Decimal> {
    match input.scalar()? {
        (Value::Decimal(d), _) => Some(*d),
        (Value::Number(n), raw) => raw
            .and_then(parse_decimal)
            .or_else(|| number_to_decimal(n)),
        (Value::String(s), _) => parse_decimal(s),
        _ => None,
    }
}

fn number_to_decimal(n: &Number) -> Option<Decimal> {
    match n {
        Number::Integer(i) => Some(Decimal::from(*i)),
        Number::Float(f) => Decimal::try_from(*f).ok(),
        _ => None,
    }
}

fn bound_decimal(bound: &Value) -> Option<Decimal> {
    match bound {
        Value::Decimal(d) => Some(*d),
        Value::Number(n) => number_to_decimal(n),
        Value::BigInt(b) => parse_decimal(&b.to_string()),
        _ => None,
    }
}

fn check_scale(d: &Decimal, scale: u32, input: &Input<'_>, def: &MemberDef) -> Result<()> {
    if d.scale() == scale {
        return Ok(());
    }
    Err(Error::validation(
        ErrorCode::InvalidScale,
        format!(
            "{} has {} fractional digits, '{}' requires exactly {}",
            d,
            d.scale(),
            def.path,
            scale
        ),
        input.range(),
    ))
}

fn integer_digits(d: &Decimal) -> u32 {
    let int = d.abs().trunc();
    if int.is_zero() {
        return 0;
    }
    int.to_string().chars().filter(char::is_ascii_digit).count() as u32
}

fn significant_digits(d: &Decimal) -> u32 {
    integer_digits(d) + d.scale()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        parse_decimal(s).unwrap()
    }

    #[test]
    fn test_digit_counts() {
        assert_eq!(integer_digits(&dec("123.456")), 3);
        assert_eq!(integer_digits(&dec("-0.5")), 0);
        assert_eq!(integer_digits(&dec("100")), 3);
        assert_eq!(significant_digits(&dec("123.456")), 6);
        assert_eq!(significant_digits(&dec("0.05")), 2);
        assert_eq!(significant_digits(&dec("50.00")), 4);
    }

    #[test]
    fn test_bounds_compare_numerically() {
        assert_eq!(bound_decimal(&Value::from(50)), Some(dec("50.00")));
        assert_eq!(bound_decimal(&Value::from("50")), None);
    }
}
