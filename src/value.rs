//! Dynamic value representation for validated Internet Object data.
//!
//! This module provides the [`Value`] enum, the output of the validation
//! pipeline and the decoded payload of scalar tokens.
//!
//! ## Core Types
//!
//! - [`Value`]: any Internet Object value (null, bool, number, decimal, bigint,
//!   string, date/time, binary, array, object)
//! - [`Number`]: floating-point and integer numbers, including `Inf`/`NaN`
//!
//! ## Examples
//!
//! ```rust
//! use internet_object::{io, Value};
//!
//! let value = io!({ "name": "Alice", "age": 30 });
//! assert!(value.is_object());
//! assert_eq!(value.get("name").and_then(|v| v.as_str()), Some("Alice"));
//!
//! // Display renders Internet Object text
//! assert_eq!(Value::Bool(true).to_string(), "T");
//! ```

use crate::ObjectMap;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;

/// A dynamically-typed representation of any Internet Object value.
///
/// # Examples
///
/// ```rust
/// use internet_object::{Value, Number};
///
/// let num = Value::Number(Number::Integer(42));
/// let text = Value::String("hello".to_string());
///
/// assert!(num.is_number());
/// assert!(text.is_string());
/// assert!(Value::Null.is_null());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    Decimal(Decimal),
    BigInt(BigInt),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Utc>),
    Binary(Vec<u8>),
    Array(Vec<Value>),
    Object(ObjectMap),
}

/// A numeric value that can be an integer, float, or special value.
///
/// # Examples
///
/// ```rust
/// use internet_object::Number;
///
/// let integer = Number::Integer(42);
/// let float = Number::Float(3.5);
///
/// assert!(integer.is_integer());
/// assert_eq!(integer.as_i64(), Some(42));
/// assert_eq!(float.as_f64(), 3.5);
/// assert!(Number::Infinity.is_special());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
    Infinity,
    NegativeInfinity,
    NaN,
}

impl Number {
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Returns `true` if this is `Inf`, `-Inf` or `NaN`.
    #[inline]
    #[must_use]
    pub const fn is_special(&self) -> bool {
        matches!(
            self,
            Number::Infinity | Number::NegativeInfinity | Number::NaN
        )
    }

    /// Converts this number to an `i64` if it is integral and in range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use internet_object::Number;
    ///
    /// assert_eq!(Number::Float(42.0).as_i64(), Some(42));
    /// assert_eq!(Number::Float(42.5).as_i64(), None);
    /// assert_eq!(Number::Infinity.as_i64(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
            Number::Infinity => f64::INFINITY,
            Number::NegativeInfinity => f64::NEG_INFINITY,
            Number::NaN => f64::NAN,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            // Keep a fractional part so the text reads back as a float.
            Number::Float(fl) if fl.fract() == 0.0 => write!(f, "{:.1}", fl),
            Number::Float(fl) => write!(f, "{}", fl),
            Number::Infinity => write!(f, "Inf"),
            Number::NegativeInfinity => write!(f, "-Inf"),
            Number::NaN => write!(f, "NaN"),
        }
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Integer(i64::from(value))
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(value)
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Number::Integer(i64::from(value))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Number::NaN
        } else if value == f64::INFINITY {
            Number::Infinity
        } else if value == f64::NEG_INFINITY {
            Number::NegativeInfinity
        } else {
            Number::Float(value)
        }
    }
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// If the value is an integer or a whole-number float, returns it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use internet_object::{Value, Number};
    ///
    /// assert_eq!(Value::Number(Number::Integer(42)).as_i64(), Some(42));
    /// assert_eq!(Value::Number(Number::Float(42.5)).as_i64(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_decimal(&self) -> Option<&Decimal> {
        match self {
            Value::Decimal(d) => Some(d),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(bi) => Some(bi),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Looks up `key` if this value is an object.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// Short name of the value's kind, used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Decimal(_) => "decimal",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::Binary(_) => "base64",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Canonical key used for `choices` membership.
    ///
    /// Numeric values compare by magnitude across representations, so `1`,
    /// `1.0`, `1.00m` and `1n` share a key.
    #[must_use]
    pub fn choice_key(&self) -> String {
        match self {
            Value::Number(Number::Integer(i)) => format!("number:{}", i),
            Value::Number(n) => match Decimal::try_from(n.as_f64()) {
                Ok(d) => format!("number:{}", d.normalize()),
                Err(_) => format!("number:{}", n),
            },
            Value::Decimal(d) => format!("number:{}", d.normalize()),
            Value::BigInt(bi) => format!("number:{}", bi),
            other => format!("{}:{}", other.kind_name(), other),
        }
    }

    /// Returns `true` when a string must be quoted to read back unchanged.
    #[must_use]
    pub fn needs_quotes(s: &str) -> bool {
        let trimmed = s.trim();
        s.is_empty()
            || trimmed.len() != s.len()
            || s.contains(|c: char| {
                matches!(
                    c,
                    ',' | ':' | '{' | '}' | '[' | ']' | '~' | '#' | '"' | '\'' | '\\'
                ) || c.is_control()
            })
            || matches!(
                s,
                "T" | "F" | "N" | "true" | "false" | "null" | "Inf" | "+Inf" | "-Inf" | "NaN"
            )
            || s.starts_with('@')
            || s.starts_with('$')
            || s.starts_with("---")
            || s.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
            || crate::tokenizer::annotation_prefix(s).is_some()
    }

    /// Writes the members of `obj` without braces. Positional keys are only
    /// written positionally while no keyed member precedes them.
    pub(crate) fn write_members(f: &mut impl fmt::Write, obj: &ObjectMap) -> fmt::Result {
        let mut positional = true;
        for (i, (k, v)) in obj.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            positional = positional && ObjectMap::is_positional_key(k, i);
            if !positional {
                Value::write_string(f, k)?;
                f.write_str(": ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }

    /// Writes `s` as an Internet Object string literal, quoting when needed.
    pub(crate) fn write_string(f: &mut impl fmt::Write, s: &str) -> fmt::Result {
        if !Self::needs_quotes(s) {
            return f.write_str(s);
        }
        f.write_char('"')?;
        for ch in s.chars() {
            match ch {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                '\u{0008}' => f.write_str("\\b")?,
                '\u{000C}' => f.write_str("\\f")?,
                c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
                c => f.write_char(c)?,
            }
        }
        f.write_char('"')
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "N"),
            Value::Bool(true) => write!(f, "T"),
            Value::Bool(false) => write!(f, "F"),
            Value::Number(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}m", d),
            Value::BigInt(bi) => write!(f, "{}n", bi),
            Value::String(s) => Value::write_string(f, s),
            Value::Date(d) => write!(f, "d\"{}\"", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "t\"{}\"", t.format("%H:%M:%S%.f")),
            Value::DateTime(dt) => write!(
                f,
                "dt\"{}\"",
                dt.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
            ),
            Value::Binary(bytes) => write!(
                f,
                "b64\"{}\"",
                base64::engine::general_purpose::STANDARD.encode(bytes)
            ),
            Value::Array(arr) => {
                f.write_str("[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
            Value::Object(obj) => {
                f.write_str("{")?;
                Value::write_members(f, obj)?;
                f.write_str("}")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            Value::Number(n) => serializer.serialize_f64(n.as_f64()),
            Value::Decimal(d) => serializer.serialize_str(&d.to_string()),
            Value::BigInt(bi) => serializer.serialize_str(&bi.to_string()),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            Value::Time(t) => serializer.serialize_str(&t.format("%H:%M:%S%.f").to_string()),
            Value::DateTime(dt) => serializer
                .serialize_str(&dt.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)),
            Value::Binary(bytes) => serializer
                .serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes)),
            Value::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value.as_i64().ok_or_else(|| mismatch("integer", &value))
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value.as_f64().ok_or_else(|| mismatch("number", &value))
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", &value))
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

fn mismatch(expected: &str, found: &Value) -> crate::Error {
    crate::Error::validation(
        crate::ErrorCode::TypeMismatch,
        format!("expected {}, found {}", expected, found.kind_name()),
        None,
    )
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Integer(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<ObjectMap> for Value {
    fn from(value: ObjectMap) -> Self {
        Value::Object(value)
    }
}

/// Host values loaded from JSON. Numbers become integers when they fit in
/// `i64` and floats otherwise.
impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(Number::Integer(i)),
                None => Value::Number(Number::from(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_tryfrom_i64() {
        let value = Value::Number(Number::Float(42.0));
        let result: i64 = TryFrom::try_from(value).unwrap();
        assert_eq!(result, 42);

        let value = Value::String("test".to_string());
        assert!(i64::try_from(value).is_err());
    }

    #[test]
    fn test_display_scalars() {
        assert_eq!(Value::Null.to_string(), "N");
        assert_eq!(Value::Bool(false).to_string(), "F");
        assert_eq!(Value::Number(Number::Float(2.0)).to_string(), "2.0");
        assert_eq!(
            Value::Decimal(Decimal::from_str("50.00").unwrap()).to_string(),
            "50.00m"
        );
        assert_eq!(Value::BigInt(BigInt::from(12)).to_string(), "12n");
        assert_eq!(Value::from("plain text").to_string(), "plain text");
        assert_eq!(Value::from("a, b").to_string(), "\"a, b\"");
        assert_eq!(Value::from("T").to_string(), "\"T\"");
        assert_eq!(Value::from("42").to_string(), "\"42\"");
    }

    #[test]
    fn test_choice_key_numeric() {
        assert_eq!(
            Value::Number(Number::Integer(1)).choice_key(),
            Value::Number(Number::Float(1.0)).choice_key()
        );
        assert_eq!(
            Value::Number(Number::Float(2.5)).choice_key(),
            Value::Decimal(Decimal::from_str("2.50").unwrap()).choice_key()
        );
        assert_ne!(
            Value::Number(Number::Integer(1)).choice_key(),
            Value::from("1").choice_key()
        );
    }

    #[test]
    fn test_number_from_f64_specials() {
        assert_eq!(Number::from(f64::INFINITY), Number::Infinity);
        assert_eq!(Number::from(f64::NEG_INFINITY), Number::NegativeInfinity);
        assert!(matches!(Number::from(f64::NAN), Number::NaN));
    }
}
