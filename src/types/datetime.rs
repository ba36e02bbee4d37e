use super::common::{check_bounds, mismatch};
use super::{Input, TypeDef};
use crate::resolve::ResolutionContext;
use crate::schema::{MemberDef, TypeName};
use crate::tokenizer::{parse_date, parse_datetime, parse_time};
use crate::{Result, Value};
use std::cmp::Ordering;

/// `date`, `time` and `datetime`. Strings are accepted in the annotated
/// formats, so `d'2024-01-02'` and `"2024-01-02"` validate alike.
pub struct DateTimeDef {
    name: TypeName,
}

impl DateTimeDef {
    pub fn new(name: TypeName) -> Self {
        DateTimeDef { name }
    }

    fn convert(&self, value: &Value) -> Option<Value> {
        match (self.name, value) {
            (TypeName::Date, Value::Date(_))
            | (TypeName::Time, Value::Time(_))
            | (TypeName::DateTime, Value::DateTime(_)) => Some(value.clone()),
            (TypeName::DateTime, Value::Date(d)) => {
                d.and_hms_opt(0, 0, 0).map(|dt| Value::DateTime(dt.and_utc()))
            }
            (TypeName::Date, Value::String(s)) => parse_date(s).map(Value::Date),
            (TypeName::Time, Value::String(s)) => parse_time(s).map(Value::Time),
            (TypeName::DateTime, Value::String(s)) => parse_datetime(s).map(Value::DateTime),
            _ => None,
        }
    }
}

impl TypeDef for DateTimeDef {
    fn name(&self) -> TypeName {
        self.name
    }

    fn validate(
        &self,
        input: Input<'_>,
        def: &MemberDef,
        _ctx: &mut ResolutionContext<'_>,
    ) -> Result<Value> {
        let expected = match self.name {
            TypeName::Date => "a date",
            TypeName::Time => "a time",
            _ => "a datetime",
        };
        let value = input
            .scalar()
            .and_then(|(v, _)| self.convert(v))
            .ok_or_else(|| mismatch(expected, &input, def))?;

        check_bounds(def, &input, &value, |bound| {
            compare(&value, &self.convert(bound)?)
        })?;
        Ok(value)
    }
}

fn compare(value: &Value, bound: &Value) -> Option<Ordering> {
    match (value, bound) {
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
