//! Schema compilation from parsed definition nodes.

use super::{MemberDef, Openness, Schema, SchemaSlot, TypeName};
use crate::ast::{MemberNode, Node, ObjectNode};
use crate::token::{Token, TokenKind};
use crate::value::Number;
use crate::{Error, ErrorCode, Result, Value};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::Arc;

const CONSTRAINT_KEYS: &[&str] = &[
    "type",
    "optional",
    "null",
    "default",
    "choices",
    "min",
    "max",
    "len",
    "minLen",
    "maxLen",
    "precision",
    "scale",
    "multipleOf",
    "pattern",
    "of",
    "schema",
];

/// Compiles the members of `obj` into a [`Schema`]. `parent_path` prefixes
/// member paths of nested schemas.
///
/// # Errors
///
/// `invalidSchema` for malformed members or duplicates, plus whatever
/// [`compile_member`] reports.
pub fn compile_object(obj: &ObjectNode, name: Option<&str>, parent_path: &str) -> Result<Schema> {
    let mut defs: IndexMap<String, MemberDef> = IndexMap::new();
    let mut open = Openness::Closed;

    for member in &obj.members {
        let (raw, value) = match (&member.key, &member.value) {
            (None, None) => continue,
            (None, Some(Node::Token(t))) => (member_name(&t.token)?, None),
            (None, Some(other)) => {
                return Err(Error::schema(
                    ErrorCode::InvalidSchema,
                    format!("expected a member name, found {}", other.describe()),
                    Some(other.range()),
                ))
            }
            (Some(key), value) => (member_name(key)?, value.as_ref()),
        };

        if raw == "*" {
            open = match value {
                None => Openness::Open(None),
                Some(v) => Openness::Open(Some(Box::new(compile_member(
                    v,
                    &join(parent_path, "*"),
                    false,
                    false,
                )?))),
            };
            continue;
        }

        let (name, optional, nullable) = split_flags(raw);
        if name.is_empty() {
            return Err(Error::schema(
                ErrorCode::InvalidSchema,
                "member name cannot be empty",
                Some(member.range),
            ));
        }
        let path = join(parent_path, name);
        let def = match value {
            None => MemberDef::new(TypeName::Any, path)
                .with_optional(optional)
                .with_nullable(nullable),
            Some(v) => compile_member(v, &path, optional, nullable)?,
        };
        if defs.insert(name.to_string(), def).is_some() {
            return Err(Error::schema(
                ErrorCode::InvalidSchema,
                format!("member '{}' is declared twice", name),
                Some(member.range),
            ));
        }
    }

    tracing::trace!(schema = ?name, members = defs.len(), "compiled schema");
    Ok(Schema::from_parts(name.map(str::to_string), defs, open))
}

/// Compiles the value side of a schema member: a type name, a `$ref`, an
/// array form, a type object `{type, constraint: value}` or a nested schema.
pub fn compile_member(value: &Node, path: &str, optional: bool, nullable: bool) -> Result<MemberDef> {
    let mut def = match value {
        Node::Token(t) => type_token(&t.token, path)?,
        Node::Array(arr) => match arr.elements.as_slice() {
            [] => MemberDef::new(TypeName::Array, path),
            [element] => {
                let mut def = MemberDef::new(TypeName::Array, path);
                def.of = Some(Box::new(compile_member(
                    element,
                    &format!("{}[]", path),
                    false,
                    false,
                )?));
                def
            }
            _ => {
                return Err(Error::schema(
                    ErrorCode::InvalidSchema,
                    "an array type takes at most one element type",
                    Some(arr.range),
                ))
            }
        },
        Node::Object(obj) if is_type_object(obj) => compile_type_object(obj, path)?,
        Node::Object(obj) => {
            let mut def = MemberDef::new(TypeName::Object, path);
            def.schema = Some(SchemaSlot::Inline(Arc::new(compile_object(obj, None, path)?)));
            def
        }
        other => {
            return Err(Error::schema(
                ErrorCode::InvalidSchema,
                format!("unexpected {} in schema", other.describe()),
                Some(other.range()),
            ))
        }
    };
    def.optional |= optional;
    def.nullable |= nullable;
    Ok(def)
}

fn type_token(token: &Token, path: &str) -> Result<MemberDef> {
    match token.kind {
        TokenKind::String => {
            let name = token.text().unwrap_or(&token.raw);
            Ok(MemberDef::new(
                TypeName::resolve(name, Some(token.range))?,
                path,
            ))
        }
        TokenKind::SchemaRef => {
            let mut def = MemberDef::new(TypeName::Object, path);
            def.schema = Some(SchemaSlot::Ref(token.raw.clone()));
            Ok(def)
        }
        _ => Err(Error::schema(
            ErrorCode::InvalidType,
            format!("expected a type name, found {}", token.kind),
            Some(token.range),
        )),
    }
}

/// `{string, maxLen: 10}` or `{type: int, min: 0}` rather than a nested
/// schema.
fn is_type_object(obj: &ObjectNode) -> bool {
    let leading_type = obj.members.first().map_or(false, |m| {
        m.key.is_none()
            && match &m.value {
                Some(Node::Token(t)) => match t.token.kind {
                    TokenKind::SchemaRef => true,
                    TokenKind::String => t.token.text().map_or(false, TypeName::is_type_like),
                    _ => false,
                },
                _ => false,
            }
    });
    if leading_type {
        return true;
    }
    obj.get("type").is_some()
        && obj
            .members
            .iter()
            .all(|m| m.key_text().map_or(false, |k| CONSTRAINT_KEYS.contains(&k)))
}

fn compile_type_object(obj: &ObjectNode, path: &str) -> Result<MemberDef> {
    let type_node = match obj.members.first() {
        Some(MemberNode {
            key: None,
            value: Some(v),
            ..
        }) => v,
        _ => obj
            .get("type")
            .and_then(|m| m.value.as_ref())
            .ok_or_else(|| {
                Error::schema(
                    ErrorCode::InvalidSchema,
                    "type definition needs a type",
                    Some(obj.range),
                )
            })?,
    };
    let mut def = compile_member(type_node, path, false, false)?;

    for (index, member) in obj.members.iter().enumerate() {
        let Some(key) = member.key_text() else {
            if index == 0 || member.value.is_none() {
                continue;
            }
            return Err(Error::schema(
                ErrorCode::InvalidSchema,
                "only the type may be given positionally",
                Some(member.range),
            ));
        };
        let Some(value) = &member.value else {
            return Err(Error::schema(
                ErrorCode::InvalidConstraint,
                format!("constraint '{}' needs a value", key),
                Some(member.range),
            ));
        };
        apply_constraint(&mut def, key, value, path)?;
    }
    Ok(def)
}

fn apply_constraint(def: &mut MemberDef, key: &str, value: &Node, path: &str) -> Result<()> {
    match key {
        "type" => {}
        "optional" => def.optional = flag(key, value)?,
        "null" => def.nullable = flag(key, value)?,
        "default" => def.default = Some(value.clone()),
        "choices" => match value {
            Node::Array(arr) => def.choices = Some(arr.elements.clone()),
            other => return Err(bad_constraint(key, "an array", other)),
        },
        "min" => def.min = Some(bound(key, value)?),
        "max" => def.max = Some(bound(key, value)?),
        "multipleOf" => def.multiple_of = Some(bound(key, value)?),
        "len" => def.len = Some(count(key, value)?),
        "minLen" => def.min_len = Some(count(key, value)?),
        "maxLen" => def.max_len = Some(count(key, value)?),
        "precision" => def.precision = Some(digits(key, value)?),
        "scale" => def.scale = Some(digits(key, value)?),
        "pattern" => {
            let text = value
                .as_token()
                .and_then(Token::text)
                .ok_or_else(|| bad_constraint(key, "a string", value))?;
            let regex = Regex::new(text).map_err(|e| {
                Error::schema(
                    ErrorCode::InvalidConstraint,
                    format!("invalid pattern: {}", e),
                    Some(value.range()),
                )
            })?;
            def.pattern = Some(regex);
        }
        "of" => {
            if def.type_name == TypeName::Any {
                def.type_name = TypeName::Array;
            }
            if def.type_name != TypeName::Array {
                return Err(bad_constraint(key, "an array type", value));
            }
            def.of = Some(Box::new(compile_member(
                value,
                &format!("{}[]", path),
                false,
                false,
            )?));
        }
        "schema" => {
            if def.type_name == TypeName::Any {
                def.type_name = TypeName::Object;
            }
            if def.type_name != TypeName::Object {
                return Err(bad_constraint(key, "an object type", value));
            }
            def.schema = Some(match value {
                Node::Token(t) if t.token.kind == TokenKind::SchemaRef => {
                    SchemaSlot::Ref(t.token.raw.clone())
                }
                Node::Object(obj) => SchemaSlot::Inline(Arc::new(compile_object(obj, None, path)?)),
                other => return Err(bad_constraint(key, "a schema", other)),
            });
        }
        unknown => {
            return Err(Error::schema(
                ErrorCode::InvalidConstraint,
                format!("unknown constraint '{}'", unknown),
                Some(value.range()),
            ))
        }
    }
    Ok(())
}

fn bad_constraint(key: &str, expected: &str, found: &Node) -> Error {
    Error::schema(
        ErrorCode::InvalidConstraint,
        format!("'{}' expects {}, found {}", key, expected, found.describe()),
        Some(found.range()),
    )
}

fn token_value<'n>(value: &'n Node) -> Option<&'n Value> {
    value.as_token().and_then(|t| t.value.as_ref())
}

fn flag(key: &str, value: &Node) -> Result<bool> {
    token_value(value)
        .and_then(Value::as_bool)
        .ok_or_else(|| bad_constraint(key, "a boolean", value))
}

fn bound(key: &str, value: &Node) -> Result<Value> {
    match token_value(value) {
        Some(
            v @ (Value::Number(_)
            | Value::Decimal(_)
            | Value::BigInt(_)
            | Value::Date(_)
            | Value::Time(_)
            | Value::DateTime(_)),
        ) => Ok(v.clone()),
        _ => Err(bad_constraint(key, "a number or date", value)),
    }
}

fn count(key: &str, value: &Node) -> Result<usize> {
    match token_value(value) {
        Some(Value::Number(Number::Integer(n))) if *n >= 0 => {
            usize::try_from(*n).map_err(|_| bad_constraint(key, "a small count", value))
        }
        _ => Err(bad_constraint(key, "a non-negative integer", value)),
    }
}

/// Largest `precision` or `scale`: the digits a `rust_decimal::Decimal`
/// mantissa holds.
const MAX_DECIMAL_DIGITS: i64 = 28;

fn digits(key: &str, value: &Node) -> Result<u32> {
    match token_value(value) {
        Some(Value::Number(Number::Integer(n))) if (0..=MAX_DECIMAL_DIGITS).contains(n) => {
            Ok(*n as u32)
        }
        _ => Err(bad_constraint(
            key,
            &format!("an integer between 0 and {}", MAX_DECIMAL_DIGITS),
            value,
        )),
    }
}

/// The text of a member name token.
fn member_name(token: &Token) -> Result<&str> {
    match token.kind {
        TokenKind::Variable | TokenKind::SchemaRef | TokenKind::Invalid(_) => Err(Error::schema(
            ErrorCode::InvalidSchema,
            format!("'{}' cannot name a member", token.raw),
            Some(token.range),
        )),
        _ => Ok(token.text().unwrap_or(&token.raw)),
    }
}

/// Strips trailing `?` (optional) and `*` (nullable) markers in any order.
fn split_flags(raw: &str) -> (&str, bool, bool) {
    let mut name = raw;
    let (mut optional, mut nullable) = (false, false);
    loop {
        if let Some(rest) = name.strip_suffix('?') {
            optional = true;
            name = rest;
        } else if let Some(rest) = name.strip_suffix('*') {
            nullable = true;
            name = rest;
        } else {
            return (name.trim_end(), optional, nullable);
        }
    }
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(src: &str) -> Result<Schema> {
        Schema::compile(src)
    }

    #[test]
    fn test_bare_names_are_any() {
        let schema = compile("{name, age, gender}").unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.member_at(1).map(|(n, _)| n), Some("age"));
        assert_eq!(schema.get("gender").unwrap().type_name, TypeName::Any);
    }

    #[test]
    fn test_flags_from_key_suffix() {
        let schema = compile("a?: string, b*: int, c?*, d*?: bool").unwrap();
        let a = schema.get("a").unwrap();
        assert!(a.optional && !a.nullable);
        assert!(schema.get("b").unwrap().nullable);
        let c = schema.get("c").unwrap();
        assert!(c.optional && c.nullable);
        assert!(schema.get("d").unwrap().optional);
    }

    #[test]
    fn test_type_object_constraints() {
        let schema =
            compile("price: {decimal, precision: 10, scale: 2, min: 0}, code: {string, pattern: '^[A-Z]+$', maxLen: 5}")
                .unwrap();
        let price = schema.get("price").unwrap();
        assert_eq!(price.type_name, TypeName::Decimal);
        assert_eq!(price.precision, Some(10));
        assert_eq!(price.scale, Some(2));
        let code = schema.get("code").unwrap();
        assert!(code.pattern.as_ref().unwrap().is_match("ABC"));
        assert_eq!(code.max_len, Some(5));
    }

    #[test]
    fn test_keyed_type_form() {
        let schema = compile("age: {type: uint8, max: 120}").unwrap();
        assert_eq!(schema.get("age").unwrap().type_name, TypeName::UInt8);
    }

    #[test]
    fn test_nested_and_array_members() {
        let schema = compile("address: {street, city}, tags: [string], items: [{id: int}]").unwrap();
        let address = schema.get("address").unwrap();
        assert_eq!(address.type_name, TypeName::Object);
        match &address.schema {
            Some(SchemaSlot::Inline(inner)) => {
                assert_eq!(inner.get("city").unwrap().path, "address.city");
            }
            other => panic!("expected inline schema, got {:?}", other),
        }
        let tags = schema.get("tags").unwrap();
        assert_eq!(tags.of.as_ref().unwrap().type_name, TypeName::String);
        let items = schema.get("items").unwrap();
        assert_eq!(items.of.as_ref().unwrap().type_name, TypeName::Object);
    }

    #[test]
    fn test_schema_references_stay_unresolved() {
        let schema = compile("home: $address, friends?: [$person]").unwrap();
        match &schema.get("home").unwrap().schema {
            Some(SchemaSlot::Ref(name)) => assert_eq!(name, "$address"),
            other => panic!("expected reference, got {:?}", other),
        }
    }

    #[test]
    fn test_open_markers() {
        assert!(!compile("a, b").unwrap().is_open());
        assert!(compile("a, *").unwrap().is_open());
        let schema = compile("a, *: int").unwrap();
        match &schema.open {
            Openness::Open(Some(def)) => assert_eq!(def.type_name, TypeName::Int),
            other => panic!("expected typed open schema, got {:?}", other),
        }
    }

    #[test]
    fn test_choices_and_default_are_kept_as_nodes() {
        let schema = compile("color: {string, choices: [@r, green], default: @r}").unwrap();
        let color = schema.get("color").unwrap();
        assert_eq!(color.choices.as_ref().unwrap().len(), 2);
        assert!(color.default.as_ref().unwrap().is_variable());
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            compile("a: {int, maximum: 3}").unwrap_err().code(),
            ErrorCode::InvalidConstraint
        );
        assert_eq!(compile("a: int64").unwrap_err().code(), ErrorCode::NotSupported);
        assert_eq!(compile("a: float32").unwrap_err().code(), ErrorCode::NotSupported);
        assert_eq!(compile("a: varchar").unwrap_err().code(), ErrorCode::InvalidType);
        assert_eq!(compile("a, a").unwrap_err().code(), ErrorCode::InvalidSchema);
        assert_eq!(
            compile("a: {string, pattern: '('}").unwrap_err().code(),
            ErrorCode::InvalidConstraint
        );
    }

    #[test]
    fn test_decimal_digit_limit() {
        let schema = compile("a: {decimal, precision: 28, scale: 28}").unwrap();
        assert_eq!(schema.get("a").unwrap().precision, Some(28));
        assert_eq!(
            compile("a: {decimal, precision: 29}").unwrap_err().code(),
            ErrorCode::InvalidConstraint
        );
        assert_eq!(
            compile("a: {decimal, scale: -1}").unwrap_err().code(),
            ErrorCode::InvalidConstraint
        );
    }
}
