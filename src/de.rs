//! Deserializing Rust types from validated values.
//!
//! [`from_value`] drives a `Deserialize` implementation from a [`Value`],
//! typically one produced by [`parse`](crate::parse) and
//! [`Document::to_value`](crate::Document::to_value).
//!
//! Values without a Serde data model counterpart are handed over as strings:
//! decimals as their digits, dates and times in ISO 8601. Big integers are
//! passed as `i128` when they fit. Binary data is passed as bytes.
//!
//! ```rust
//! use internet_object::{from_value, parse};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Person { name: String, age: u8 }
//!
//! let doc = parse("name, age: int\n---\nAnn, 30").unwrap();
//! let person: Person = from_value(doc.to_value()).unwrap();
//! assert_eq!(person, Person { name: "Ann".into(), age: 30 });
//! ```

use crate::{Error, Number, ObjectMap, Result, Value};
use serde::de::{Error as _, IntoDeserializer};
use serde::{de, forward_to_deserialize_any};

/// Deserializes `T` from `value`.
///
/// # Errors
///
/// `conversionFailed` when the value does not have the shape `T` expects.
pub fn from_value<T: de::DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(ValueDeserializer::new(value))
}

/// A Serde deserializer over an owned [`Value`].
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    #[must_use]
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(Number::Integer(i)) => visitor.visit_i64(i),
            Value::Number(n) => visitor.visit_f64(n.as_f64()),
            Value::Decimal(d) => visitor.visit_string(d.to_string()),
            Value::BigInt(bi) => match i128::try_from(&bi) {
                Ok(i) => visitor.visit_i128(i),
                Err(_) => visitor.visit_string(bi.to_string()),
            },
            Value::String(s) => visitor.visit_string(s),
            Value::Date(d) => visitor.visit_string(d.format("%Y-%m-%d").to_string()),
            Value::Time(t) => visitor.visit_string(t.format("%H:%M:%S%.f").to_string()),
            Value::DateTime(dt) => visitor.visit_string(dt.to_rfc3339()),
            Value::Binary(bytes) => visitor.visit_byte_buf(bytes),
            Value::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            Value::Object(obj) => visitor.visit_map(MapDeserializer::new(obj)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            value => visitor.visit_some(ValueDeserializer::new(value)),
        }
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(variant) => visitor.visit_enum(variant.into_deserializer()),
            Value::Object(obj) if obj.len() == 1 => {
                let Some((variant, value)) = obj.into_iter().next() else {
                    return Err(Error::custom("expected a single-key object for an enum"));
                };
                visitor.visit_enum(EnumDeserializer::new(variant, value))
            }
            other => Err(Error::custom(format!(
                "expected a string or single-key object for an enum, found {}",
                other.kind_name()
            ))),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: ObjectMap) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(Value::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Value,
}

impl EnumDeserializer {
    fn new(variant: String, value: Value) -> Self {
        EnumDeserializer { variant, value }
    }
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Value,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            _ => Err(Error::custom("expected a unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(ValueDeserializer::new(self.value))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            _ => Err(Error::custom("expected a tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Object(obj) => visitor.visit_map(MapDeserializer::new(obj)),
            _ => Err(Error::custom("expected a struct variant")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Item {
        name: String,
        tags: Vec<String>,
        note: Option<String>,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    enum Status {
        Active,
        Limited(u32),
    }

    fn object(entries: Vec<(&str, Value)>) -> Value {
        Value::Object(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn test_struct_with_option() {
        let value = object(vec![
            ("name", Value::from("pen")),
            ("tags", Value::Array(vec![Value::from("blue")])),
            ("note", Value::Null),
        ]);
        let item: Item = from_value(value).unwrap();
        assert_eq!(
            item,
            Item {
                name: "pen".into(),
                tags: vec!["blue".into()],
                note: None
            }
        );
    }

    #[test]
    fn test_enums() {
        let active: Status = from_value(Value::from("Active")).unwrap();
        assert_eq!(active, Status::Active);
        let limited: Status = from_value(object(vec![("Limited", Value::from(3))])).unwrap();
        assert_eq!(limited, Status::Limited(3));
    }

    #[test]
    fn test_decimal_as_string() {
        let d = rust_decimal::Decimal::new(5000, 2);
        let s: String = from_value(Value::Decimal(d)).unwrap();
        assert_eq!(s, "50.00");
    }

    #[test]
    fn test_shape_mismatch() {
        let err = from_value::<u8>(Value::from("x")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConversionFailed);
    }
}
