//! Compiled schema model.
//!
//! A [`Schema`] is an ordered set of [`MemberDef`]s. Member order is the
//! order of first appearance in the definition and decides which member a
//! positional value fills. Schemas are immutable once compiled and are shared
//! behind [`Arc`] so definitions, nested members and resolution caches can
//! all hold the same instance.
//!
//! ## Examples
//!
//! ```rust
//! use internet_object::schema::{Schema, TypeName};
//!
//! let schema = Schema::compile("name: string, age?: {int, min: 0}, tags: [string]").unwrap();
//! assert_eq!(schema.names().collect::<Vec<_>>(), vec!["name", "age", "tags"]);
//!
//! let age = schema.get("age").unwrap();
//! assert_eq!(age.type_name, TypeName::Int);
//! assert!(age.optional);
//! ```

mod compile;

pub use compile::{compile_member, compile_object};

use crate::ast::Node;
use crate::{Error, ErrorCode, PositionRange, Result, Value};
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Built-in type names accepted in schema definitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeName {
    Any,
    String,
    Email,
    Url,
    Number,
    Int,
    UInt,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    BigInt,
    Decimal,
    Bool,
    Date,
    Time,
    DateTime,
    Base64,
    Array,
    Object,
}

/// Names that look like types but are deliberately not supported.
const UNSUPPORTED_TYPES: &[&str] = &["int64", "uint64", "float32", "float64"];

impl TypeName {
    pub const ALL: [TypeName; 22] = [
        TypeName::Any,
        TypeName::String,
        TypeName::Email,
        TypeName::Url,
        TypeName::Number,
        TypeName::Int,
        TypeName::UInt,
        TypeName::Int8,
        TypeName::UInt8,
        TypeName::Int16,
        TypeName::UInt16,
        TypeName::Int32,
        TypeName::UInt32,
        TypeName::BigInt,
        TypeName::Decimal,
        TypeName::Bool,
        TypeName::Date,
        TypeName::Time,
        TypeName::DateTime,
        TypeName::Base64,
        TypeName::Array,
        TypeName::Object,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TypeName::Any => "any",
            TypeName::String => "string",
            TypeName::Email => "email",
            TypeName::Url => "url",
            TypeName::Number => "number",
            TypeName::Int => "int",
            TypeName::UInt => "uint",
            TypeName::Int8 => "int8",
            TypeName::UInt8 => "uint8",
            TypeName::Int16 => "int16",
            TypeName::UInt16 => "uint16",
            TypeName::Int32 => "int32",
            TypeName::UInt32 => "uint32",
            TypeName::BigInt => "bigint",
            TypeName::Decimal => "decimal",
            TypeName::Bool => "bool",
            TypeName::Date => "date",
            TypeName::Time => "time",
            TypeName::DateTime => "datetime",
            TypeName::Base64 => "base64",
            TypeName::Array => "array",
            TypeName::Object => "object",
        }
    }

    /// Looks up a type by its schema name. `boolean` is an alias of `bool`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<TypeName> {
        if name == "boolean" {
            return Some(TypeName::Bool);
        }
        TypeName::ALL.iter().copied().find(|t| t.as_str() == name)
    }

    /// Like [`TypeName::from_name`], but distinguishes unsupported names
    /// (`notSupported`) from unknown ones (`invalidType`).
    pub fn resolve(name: &str, range: Option<PositionRange>) -> Result<TypeName> {
        if let Some(t) = TypeName::from_name(name) {
            return Ok(t);
        }
        if UNSUPPORTED_TYPES.contains(&name) {
            return Err(Error::schema(
                ErrorCode::NotSupported,
                format!("type '{}' is not supported", name),
                range,
            ));
        }
        Err(Error::schema(
            ErrorCode::InvalidType,
            format!("unknown type '{}'", name),
            range,
        ))
    }

    /// `true` for names that should be read as a type, including the
    /// unsupported ones so they are reported rather than taken as members.
    #[must_use]
    pub fn is_type_like(name: &str) -> bool {
        TypeName::from_name(name).is_some() || UNSUPPORTED_TYPES.contains(&name)
    }

    /// Native range of the integer family; `None` for other types.
    #[must_use]
    pub const fn integer_bounds(&self) -> Option<(i64, i64)> {
        match self {
            TypeName::Int => Some((i64::MIN, i64::MAX)),
            TypeName::UInt => Some((0, i64::MAX)),
            TypeName::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            TypeName::UInt8 => Some((0, u8::MAX as i64)),
            TypeName::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            TypeName::UInt16 => Some((0, u16::MAX as i64)),
            TypeName::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            TypeName::UInt32 => Some((0, u32::MAX as i64)),
            _ => None,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nested schema of an object member: compiled inline or named.
#[derive(Clone, Debug)]
pub enum SchemaSlot {
    Inline(Arc<Schema>),
    /// `$name`, resolved lazily during validation.
    Ref(String),
}

/// Whether a schema accepts members it does not declare.
#[derive(Clone, Debug, Default)]
pub enum Openness {
    #[default]
    Closed,
    /// `*` accepts anything; `*: type` validates extras against `type`.
    Open(Option<Box<MemberDef>>),
}

/// Compiled validation rule for one member.
#[derive(Clone, Debug)]
pub struct MemberDef {
    pub type_name: TypeName,
    /// Dotted location used in error messages, e.g. `address.city`.
    pub path: String,
    pub optional: bool,
    pub nullable: bool,
    pub default: Option<Node>,
    pub choices: Option<Vec<Node>>,
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub multiple_of: Option<Value>,
    pub len: Option<usize>,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub pattern: Option<Regex>,
    pub schema: Option<SchemaSlot>,
    /// Element rule for arrays.
    pub of: Option<Box<MemberDef>>,
}

impl MemberDef {
    #[must_use]
    pub fn new(type_name: TypeName, path: impl Into<String>) -> Self {
        MemberDef {
            type_name,
            path: path.into(),
            optional: false,
            nullable: false,
            default: None,
            choices: None,
            min: None,
            max: None,
            multiple_of: None,
            len: None,
            min_len: None,
            max_len: None,
            precision: None,
            scale: None,
            pattern: None,
            schema: None,
            of: None,
        }
    }

    #[must_use]
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Element rule for an array member, `any` when none was declared.
    #[must_use]
    pub fn element(&self) -> MemberDef {
        match &self.of {
            Some(of) => (**of).clone(),
            None => MemberDef::new(TypeName::Any, format!("{}[]", self.path)),
        }
    }

    /// The member name, the last segment of `path`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

impl fmt::Display for MemberDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        match (&self.type_name, &self.schema) {
            (TypeName::Object, Some(SchemaSlot::Ref(name))) => parts.push(name.clone()),
            (TypeName::Object, Some(SchemaSlot::Inline(schema))) => {
                parts.push("object".to_string());
                parts.push(format!("schema: {}", schema));
            }
            (t, _) => parts.push(t.to_string()),
        }
        if let Some(of) = &self.of {
            parts.push(format!("of: {}", of));
        }
        if let Some(default) = &self.default {
            parts.push(format!("default: {}", default));
        }
        if let Some(choices) = &self.choices {
            let items: Vec<String> = choices.iter().map(ToString::to_string).collect();
            parts.push(format!("choices: [{}]", items.join(", ")));
        }
        for (key, value) in [
            ("min", &self.min),
            ("max", &self.max),
            ("multipleOf", &self.multiple_of),
        ] {
            if let Some(v) = value {
                parts.push(format!("{}: {}", key, v));
            }
        }
        for (key, value) in [
            ("len", self.len),
            ("minLen", self.min_len),
            ("maxLen", self.max_len),
        ] {
            if let Some(v) = value {
                parts.push(format!("{}: {}", key, v));
            }
        }
        if let Some(p) = self.precision {
            parts.push(format!("precision: {}", p));
        }
        if let Some(s) = self.scale {
            parts.push(format!("scale: {}", s));
        }
        if let Some(pattern) = &self.pattern {
            let mut quoted = String::new();
            Value::write_string(&mut quoted, pattern.as_str())?;
            parts.push(format!("pattern: {}", quoted));
        }

        if parts.len() == 1 {
            f.write_str(&parts[0])
        } else {
            write!(f, "{{{}}}", parts.join(", "))
        }
    }
}

/// An ordered, immutable set of member definitions.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    pub name: Option<String>,
    defs: IndexMap<String, MemberDef>,
    pub open: Openness,
}

impl Schema {
    pub(crate) fn from_parts(
        name: Option<String>,
        defs: IndexMap<String, MemberDef>,
        open: Openness,
    ) -> Self {
        Schema { name, defs, open }
    }

    /// Compiles a schema definition such as `name, age?: int, *`.
    ///
    /// Surrounding braces are optional.
    ///
    /// # Errors
    ///
    /// Syntax errors in the text, or a schema error (`invalidSchema`,
    /// `invalidType`, `invalidConstraint`, `notSupported`).
    pub fn compile(source: &str) -> Result<Schema> {
        let node = crate::parser::parse_value(source, &crate::ParseOptions::default())?;
        Schema::compile_node(&node, None)
    }

    /// Compiles an already parsed object node.
    pub fn compile_node(node: &Node, name: Option<&str>) -> Result<Schema> {
        match node {
            Node::Object(obj) => compile_object(obj, name, ""),
            other => Err(Error::schema(
                ErrorCode::InvalidSchema,
                format!("expected an object schema, found {}", other.describe()),
                Some(other.range()),
            )),
        }
    }

    /// Member names in positional order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MemberDef> {
        self.defs.get(name)
    }

    /// Position and rule of a named member.
    #[must_use]
    pub fn get_full(&self, name: &str) -> Option<(usize, &MemberDef)> {
        self.defs.get_full(name).map(|(i, _, def)| (i, def))
    }

    /// The member filled by the positional value at `index`.
    #[must_use]
    pub fn member_at(&self, index: usize) -> Option<(&str, &MemberDef)> {
        self.defs
            .get_index(index)
            .map(|(name, def)| (name.as_str(), def))
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &MemberDef)> {
        self.defs.iter().map(|(name, def)| (name.as_str(), def))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.open, Openness::Open(_))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, def)) in self.defs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            Value::write_string(f, name)?;
            if def.optional {
                f.write_str("?")?;
            }
            if def.nullable {
                f.write_str("*")?;
            }
            if def.type_name != TypeName::Any || def.default.is_some() || def.choices.is_some() {
                write!(f, ": {}", def)?;
            }
        }
        match &self.open {
            Openness::Closed => {}
            Openness::Open(extra) => {
                if !self.defs.is_empty() {
                    f.write_str(", ")?;
                }
                match extra {
                    None => f.write_str("*")?,
                    Some(def) => write!(f, "*: {}", def)?,
                }
            }
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_lookup() {
        assert_eq!(TypeName::from_name("boolean"), Some(TypeName::Bool));
        assert_eq!(TypeName::from_name("uint16"), Some(TypeName::UInt16));
        assert_eq!(TypeName::from_name("float"), None);
        assert!(TypeName::is_type_like("int64"));
    }

    #[test]
    fn test_unsupported_and_unknown_types() {
        let err = TypeName::resolve("float64", None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotSupported);
        let err = TypeName::resolve("varchar", None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidType);
    }

    #[test]
    fn test_integer_bounds() {
        assert_eq!(TypeName::Int8.integer_bounds(), Some((-128, 127)));
        assert_eq!(TypeName::UInt32.integer_bounds(), Some((0, 4_294_967_295)));
        assert_eq!(TypeName::Decimal.integer_bounds(), None);
    }

    #[test]
    fn test_display_reads_back() {
        let schema = Schema::compile("name, age?: {int, min: 0}, tags: [string], *").unwrap();
        let text = schema.to_string();
        let again = Schema::compile(&text).unwrap();
        assert_eq!(again.to_string(), text);
        assert!(again.is_open());
    }
}
