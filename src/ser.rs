//! Internet Object output.
//!
//! [`stringify`] renders a validated [`Document`] back to text: the header
//! definitions as a `~` collection, then each section. Objects validated
//! against a schema are written positionally in schema order, so the output
//! reads back to the same values under the same definitions.
//!
//! [`to_value`] converts any `Serialize` type into a [`Value`], which can then
//! be rendered with [`stringify_value`].
//!
//! ```rust
//! use internet_object::{parse, stringify, StringifyOptions};
//!
//! let text = "~ $schema: {name, age: int}\n---\n~ Ann, 30\n~ Bob, 41";
//! let doc = parse(text).unwrap();
//! let out = stringify(&doc, &StringifyOptions::default()).unwrap();
//! assert_eq!(parse(&out).unwrap().to_value(), doc.to_value());
//! ```

use crate::definitions::{Definition, Definitions};
use crate::document::{CollectionItem, Document, Section, SectionData};
use crate::resolve::ResolutionContext;
use crate::schema::Schema;
use crate::types::{stringify_member, TypeRegistry};
use crate::{Error, Number, ObjectMap, Result, StringifyOptions, Value};
use serde::ser::Error as _;
use serde::{ser, Serialize};
use std::fmt::Write as _;

/// Renders a document as Internet Object text.
///
/// # Errors
///
/// A schema reference that no longer resolves.
pub fn stringify(doc: &Document, options: &StringifyOptions) -> Result<String> {
    let defs = doc.definitions();
    let mut ctx = ResolutionContext::new(defs, TypeRegistry::global());
    let mut out = String::new();

    let header = options.include_header && !defs.is_empty();
    if header {
        write_header(&mut out, defs);
    }

    let sections = doc.sections();
    let separated = header
        || sections.len() > 1
        || (options.section_names && sections.iter().any(|s| s.name.is_some() || s.schema_name.is_some()));

    for section in sections {
        if separated {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("---");
            if options.section_names {
                write_section_header(&mut out, section);
            }
        }
        let body = section_body(section, &mut ctx)?;
        if !body.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&body);
        }
    }
    tracing::debug!(bytes = out.len(), "stringified document");
    Ok(out)
}

/// Renders a single value, positionally when `schema` is given.
///
/// # Errors
///
/// A schema reference inside `schema` cannot be resolved without
/// definitions.
pub fn stringify_value(value: &Value, schema: Option<&Schema>) -> Result<String> {
    let defs = Definitions::new();
    let mut ctx = ResolutionContext::new(&defs, TypeRegistry::global());
    top_level(value, schema, &mut ctx)
}

fn write_header(out: &mut String, defs: &Definitions) {
    for (i, (name, def)) in defs.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = match def {
            Definition::Value(node) => write!(out, "~ {}: {}", name, node),
            Definition::Schema(schema) => write!(out, "~ {}: {}", name, schema),
        };
    }
}

fn write_section_header(out: &mut String, section: &Section) {
    match (&section.name, &section.schema_name) {
        (Some(name), Some(schema)) if schema.strip_prefix('$') == Some(name.as_str()) => {
            let _ = write!(out, " {}", schema);
        }
        (Some(name), Some(schema)) => {
            let _ = write!(out, " {}: {}", name, schema);
        }
        (Some(name), None) => {
            let _ = write!(out, " {}", name);
        }
        (None, Some(schema)) => {
            let _ = write!(out, " {}", schema);
        }
        (None, None) => {}
    }
}

fn section_body(section: &Section, ctx: &mut ResolutionContext<'_>) -> Result<String> {
    let schema = section.schema.as_deref();
    match &section.data {
        SectionData::Empty | SectionData::Error(_) => Ok(String::new()),
        SectionData::Value(value) => top_level(value, schema, ctx),
        SectionData::Collection(col) => {
            let mut lines = Vec::with_capacity(col.len());
            for item in col.items() {
                if let CollectionItem::Valid(value) = item {
                    lines.push(format!("~ {}", top_level(value, schema, ctx)?));
                }
            }
            Ok(lines.join("\n"))
        }
    }
}

/// A section value or collection item, written as an implicit object.
fn top_level(value: &Value, schema: Option<&Schema>, ctx: &mut ResolutionContext<'_>) -> Result<String> {
    match (value, schema) {
        (Value::Object(map), Some(schema)) => write_schema_members(map, schema, ctx),
        (Value::Object(map), None) if map.is_empty() => Ok("{}".to_string()),
        // A lone positional container would be unwrapped on reading.
        (Value::Object(map), None)
            if map.len() == 1
                && map.contains_key("0")
                && matches!(map.get("0"), Some(Value::Object(_) | Value::Array(_))) =>
        {
            Ok(value.to_string())
        }
        (Value::Object(map), None) => {
            let mut out = String::new();
            Value::write_members(&mut out, map).map_err(Error::custom)?;
            Ok(out)
        }
        (other, _) => Ok(other.to_string()),
    }
}

/// Members of `map` in schema order, positionally, followed by keyed extras.
/// Absent optional members leave an empty slot.
pub(crate) fn write_schema_members(
    map: &ObjectMap,
    schema: &Schema,
    ctx: &mut ResolutionContext<'_>,
) -> Result<String> {
    let mut parts = Vec::with_capacity(map.len());
    for (name, def) in schema.members() {
        match map.get(name) {
            Some(value) => parts.push(stringify_member(value, def, ctx)?),
            None => parts.push(String::new()),
        }
    }
    while parts.last().map_or(false, String::is_empty) {
        parts.pop();
    }
    for (key, value) in map.iter() {
        if schema.get(key).is_none() {
            let mut part = String::new();
            Value::write_string(&mut part, key).map_err(Error::custom)?;
            let _ = write!(part, ": {}", value);
            parts.push(part);
        }
    }
    Ok(parts.join(", "))
}

/// Converts a `Serialize` type into a [`Value`].
///
/// # Errors
///
/// `conversionFailed` for map keys that are not strings and for tuple or
/// struct enum variants.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}

/// Serializer producing a [`Value`] tree.
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
}

pub struct SerializeMap {
    map: ObjectMap,
    current_key: Option<String>,
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Number(Number::Integer(i64::from(v))))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Number(Number::Integer(i64::from(v))))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Number(Number::Integer(i64::from(v))))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Number(Number::Integer(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Number(Number::Integer(i64::from(v))))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Number(Number::Integer(i64::from(v))))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::Number(Number::Integer(i64::from(v))))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        match i64::try_from(v) {
            Ok(i) => Ok(Value::Number(Number::Integer(i))),
            Err(_) => Ok(Value::BigInt(v.into())),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Number(Number::from(f64::from(v))))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Number(Number::from(v)))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Binary(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        let mut map = ObjectMap::new();
        map.insert(variant.to_string(), to_value(value)?);
        Ok(Value::Object(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeVec> {
        Err(Error::custom(format!("tuple variant '{}' is not supported", variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeMap> {
        Err(Error::custom(format!("struct variant '{}' is not supported", variant)))
    }
}

impl SerializeVec {
    fn new(capacity: usize) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
        }
    }
}

impl SerializeMap {
    fn new() -> Self {
        SerializeMap {
            map: ObjectMap::new(),
            current_key: None,
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.vec))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match to_value(key)? {
            Value::String(s) => {
                self.current_key = Some(s);
                Ok(())
            }
            Value::Number(Number::Integer(i)) => {
                self.current_key = Some(i.to_string());
                Ok(())
            }
            other => Err(Error::custom(format!(
                "map keys must be strings, found {}",
                other.kind_name()
            ))),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.map))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.map))
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeStruct::end(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Serialize)]
    enum Shape {
        Circle(u32),
        Empty,
    }

    #[test]
    fn test_to_value_struct() {
        let value = to_value(&Point { x: 1, y: -2 }).unwrap();
        assert_eq!(value.get("x"), Some(&Value::from(1)));
        assert_eq!(value.get("y"), Some(&Value::from(-2)));
    }

    #[test]
    fn test_to_value_enums() {
        assert_eq!(to_value(&Shape::Empty).unwrap(), Value::from("Empty"));
        let circle = to_value(&Shape::Circle(3)).unwrap();
        assert_eq!(circle.get("Circle"), Some(&Value::from(3)));
    }

    #[test]
    fn test_to_value_large_u64() {
        assert!(matches!(to_value(&u64::MAX).unwrap(), Value::BigInt(_)));
    }

    #[test]
    fn test_schema_members_are_positional() {
        let schema = Schema::compile("name, age?: int, city?").unwrap();
        let value = to_value(&serde_json::json!({"name": "Ann", "city": "Oslo"})).unwrap();
        assert_eq!(stringify_value(&value, Some(&schema)).unwrap(), "Ann, , Oslo");
    }

    #[test]
    fn test_trailing_absent_members_are_dropped() {
        let schema = Schema::compile("name, age?: int, city?").unwrap();
        let value = to_value(&serde_json::json!({"name": "Ann"})).unwrap();
        assert_eq!(stringify_value(&value, Some(&schema)).unwrap(), "Ann");
    }

    #[test]
    fn test_schemaless_value() {
        let value = to_value(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(stringify_value(&value, None).unwrap(), "x: 1, y: 2");
    }

    #[test]
    fn test_stringify_document_with_header() {
        let doc = parse("~ @r: red\n~ $schema: {name, color}\n---\n~ Ann, @r\n~ Bob, blue").unwrap();
        let text = stringify(&doc, &StringifyOptions::default()).unwrap();
        assert!(text.starts_with("~ @r: red\n~ $schema: "));
        assert!(text.ends_with("---\n~ Ann, red\n~ Bob, blue"));
        assert_eq!(parse(&text).unwrap().to_value(), doc.to_value());
    }

    #[test]
    fn test_stringify_named_sections() {
        let doc = parse("~ $a: {x: int}\n--- first: $a\n1\n--- second\ny: 2").unwrap();
        let text = stringify(&doc, &StringifyOptions::default()).unwrap();
        assert!(text.contains("--- first: $a\n1"));
        assert!(text.contains("--- second\ny: 2"));
        assert_eq!(parse(&text).unwrap().to_value(), doc.to_value());
    }
}
