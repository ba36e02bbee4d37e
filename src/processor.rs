//! Applies schemas to parsed sections.
//!
//! An object is matched to its schema in two phases. Leading positional
//! members fill schema members in declaration order; keyed members then fill
//! the rest by name. Members left unfilled take their default, are omitted
//! when optional, and otherwise fail with `valueRequired`. Values the schema
//! does not declare are rejected by closed schemas and kept (validated
//! against the `*` type, when one is given) by open ones.
//!
//! Within a collection every item is processed on its own: a failing item is
//! recorded and replaced by an error slot, and processing moves on.
//!
//! ```rust
//! use internet_object::{parse, Value};
//!
//! let doc = parse("name, age?: int, city: string\n---\nAnn, , city: Oslo").unwrap();
//! let value = doc.to_value();
//! assert_eq!(value.get("name"), Some(&Value::from("Ann")));
//! assert_eq!(value.get("age"), None);
//! assert_eq!(value.get("city"), Some(&Value::from("Oslo")));
//! ```

use crate::ast::{CollectionNode, DocumentNode, ErrorNode, Node, ObjectNode, SectionNode};
use crate::definitions::{Definitions, DEFAULT_SCHEMA};
use crate::document::{Collection, CollectionItem, Document, Section, SectionData};
use crate::position::PositionRange;
use crate::resolve::ResolutionContext;
use crate::schema::{MemberDef, Openness, Schema};
use crate::token::TokenKind;
use crate::types::{check_member, parse_member, TypeRegistry};
use crate::{Error, ErrorCode, ObjectMap, ParseOptions, Result, Value};
use std::sync::Arc;

/// Builds the validated [`Document`] from a parsed one.
///
/// Definitions come from the header; `external` entries are added for names
/// the header leaves undefined.
///
/// # Errors
///
/// Only in strict mode, with the first recovered error.
pub fn process_document(
    ast: DocumentNode,
    external: Option<&Definitions>,
    options: &ParseOptions,
) -> Result<Document> {
    let DocumentNode {
        header,
        sections,
        mut errors,
    } = ast;

    let mut defs = match &header {
        Some(header) => Definitions::from_header(header, &mut errors),
        None => Definitions::new(),
    };
    if let Some(external) = external {
        defs.merge(external);
    }
    if options.strict {
        if let Some(first) = errors.first() {
            return Err(first.clone());
        }
    }

    let mut ctx = ResolutionContext::new(&defs, TypeRegistry::global());
    let mut processed = Vec::with_capacity(sections.len());
    for section in &sections {
        processed.push(process_section(section, &mut ctx, &mut errors, options.strict)?);
    }
    drop(ctx);

    tracing::debug!(
        sections = processed.len(),
        errors = errors.len(),
        "processed document"
    );
    Ok(Document::new(defs, processed, errors))
}

fn process_section(
    node: &SectionNode,
    ctx: &mut ResolutionContext<'_>,
    errors: &mut Vec<Error>,
    strict: bool,
) -> Result<Section> {
    let schema_name = node.schema.clone().or_else(|| {
        ctx.definitions()
            .contains(DEFAULT_SCHEMA)
            .then(|| DEFAULT_SCHEMA.to_string())
    });

    let fail = |error: Error, errors: &mut Vec<Error>| -> Result<SectionData> {
        if strict {
            return Err(error);
        }
        tracing::debug!(code = %error.code(), "section failed");
        errors.push(error.clone());
        Ok(SectionData::Error(ErrorNode {
            error,
            range: node.range,
        }))
    };

    let schema = match &schema_name {
        Some(name) => match ctx.resolve_schema(name) {
            Ok(schema) => Some(schema),
            Err(e) => {
                let data = fail(e.with_range(node.range), errors)?;
                return Ok(section(node, None, data));
            }
        },
        None => None,
    };

    let data = match &node.child {
        None => SectionData::Empty,
        // Recorded by the parser.
        Some(Node::Error(err)) => SectionData::Error(err.clone()),
        Some(Node::Collection(col)) => SectionData::Collection(process_collection(
            col,
            schema.as_deref(),
            ctx,
            errors,
            strict,
        )?),
        Some(child) => match process_node(child, schema.as_deref(), ctx) {
            Ok(value) => SectionData::Value(value),
            Err(e) => fail(e.with_range(child.range()), errors)?,
        },
    };
    Ok(section(node, schema, data))
}

fn section(node: &SectionNode, schema: Option<Arc<Schema>>, data: SectionData) -> Section {
    Section {
        name: node.name.clone(),
        schema_name: node.schema.clone(),
        schema,
        data,
    }
}

/// Processes every item of a collection independently.
///
/// # Errors
///
/// Only in strict mode, with the first failing item's error.
pub fn process_collection(
    col: &CollectionNode,
    schema: Option<&Schema>,
    ctx: &mut ResolutionContext<'_>,
    errors: &mut Vec<Error>,
    strict: bool,
) -> Result<Collection> {
    let mut items = Vec::with_capacity(col.items.len());
    for item in &col.items {
        match item {
            // Recorded by the parser already.
            Node::Error(err) => items.push(CollectionItem::Error(err.clone())),
            node => match process_node(node, schema, ctx) {
                Ok(value) => items.push(CollectionItem::Valid(value)),
                Err(e) if strict => return Err(e),
                Err(e) => {
                    let range = node.range();
                    let error = e.with_range(range);
                    tracing::debug!(code = %error.code(), "collection item failed");
                    errors.push(error.clone());
                    items.push(CollectionItem::Error(ErrorNode { error, range }));
                }
            },
        }
    }
    Ok(Collection::new(items))
}

/// Processes one section value or collection item. A non-object value under
/// a schema fills the first schema member.
///
/// # Errors
///
/// The first validation error.
pub fn process_node(
    node: &Node,
    schema: Option<&Schema>,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Value> {
    match (node, schema) {
        (_, None) => node_to_value(node, ctx),
        (Node::Object(obj), Some(schema)) => process_object(obj, schema, ctx),
        (other, Some(schema)) => {
            let entry = Entry {
                key: None,
                slot: Slot::Node(Some(other)),
                range: Some(other.range()),
            };
            process_entries(vec![entry], schema, Some(other.range()), ctx)
        }
    }
}

/// Validates a parsed object against `schema`.
///
/// # Errors
///
/// The first validation error.
pub fn process_object(
    obj: &ObjectNode,
    schema: &Schema,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Value> {
    let entries = obj
        .members
        .iter()
        .map(|m| Entry {
            key: m.key_text(),
            slot: Slot::Node(m.value.as_ref()),
            range: Some(m.range),
        })
        .collect();
    process_entries(entries, schema, Some(obj.range), ctx)
}

/// Validates an in-memory object against `schema`. Leading keys named
/// `"0"`, `"1"`, ... are taken as positional.
///
/// # Errors
///
/// The first validation error.
pub fn process_map(
    map: &ObjectMap,
    schema: &Schema,
    range: Option<PositionRange>,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Value> {
    let mut positional = true;
    let entries = map
        .iter()
        .enumerate()
        .map(|(i, (k, v))| {
            positional = positional && ObjectMap::is_positional_key(k, i);
            Entry {
                key: (!positional).then_some(k.as_str()),
                slot: Slot::Value(v),
                range,
            }
        })
        .collect();
    process_entries(entries, schema, range, ctx)
}

enum Slot<'a> {
    /// `None` for an empty member.
    Node(Option<&'a Node>),
    Value(&'a Value),
}

struct Entry<'a> {
    key: Option<&'a str>,
    slot: Slot<'a>,
    range: Option<PositionRange>,
}

impl Entry<'_> {
    fn validate(&self, def: &MemberDef, ctx: &mut ResolutionContext<'_>) -> Result<Option<Value>> {
        let result = match self.slot {
            Slot::Node(node) => parse_member(node, def, ctx),
            Slot::Value(value) => check_member(Some(value), self.range, def, ctx),
        };
        result.map_err(|e| attach(e, self.range))
    }

    fn is_empty(&self) -> bool {
        matches!(self.slot, Slot::Node(None))
    }
}

fn process_entries(
    entries: Vec<Entry<'_>>,
    schema: &Schema,
    range: Option<PositionRange>,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Value> {
    let mut filled: Vec<Option<Value>> = (0..schema.len()).map(|_| None).collect();
    let mut seen = vec![false; schema.len()];
    let mut extras = ObjectMap::new();

    for (index, entry) in entries.iter().enumerate() {
        match entry.key {
            None => match schema.member_at(index) {
                Some((_, def)) => {
                    filled[index] = entry.validate(def, ctx)?;
                    seen[index] = true;
                }
                None => add_extra(entry, index.to_string(), schema, ctx, &mut extras)?,
            },
            Some(key) => match schema.get_full(key) {
                Some((i, def)) => {
                    if seen[i] {
                        return Err(duplicate(key, entry.range));
                    }
                    filled[i] = entry.validate(def, ctx)?;
                    seen[i] = true;
                }
                None => {
                    if extras.contains_key(key) {
                        return Err(duplicate(key, entry.range));
                    }
                    add_extra(entry, key.to_string(), schema, ctx, &mut extras)?;
                }
            },
        }
    }

    for (i, (_, def)) in schema.members().enumerate() {
        if !seen[i] {
            filled[i] = parse_member(None, def, ctx).map_err(|e| attach(e, range))?;
        }
    }

    let mut out = ObjectMap::new();
    for ((name, _), value) in schema.members().zip(filled) {
        if let Some(value) = value {
            out.insert(name.to_string(), value);
        }
    }
    for (key, value) in extras {
        out.insert(key, value);
    }
    Ok(Value::Object(out))
}

fn add_extra(
    entry: &Entry<'_>,
    key: String,
    schema: &Schema,
    ctx: &mut ResolutionContext<'_>,
    extras: &mut ObjectMap,
) -> Result<()> {
    if entry.is_empty() {
        return Ok(());
    }
    let value = match &schema.open {
        Openness::Closed => {
            let error = match entry.key {
                Some(key) => Error::validation(
                    ErrorCode::UnknownMember,
                    format!("'{}' is not defined in the schema", key),
                    entry.range,
                ),
                None => Error::validation(
                    ErrorCode::AdditionalValuesNotAllowed,
                    format!("the schema has {} members, found more values", schema.len()),
                    entry.range,
                ),
            };
            return Err(error);
        }
        Openness::Open(None) => match entry.slot {
            Slot::Node(Some(node)) => Some(node_to_value(node, ctx)?),
            Slot::Node(None) => None,
            Slot::Value(value) => Some(value.clone()),
        },
        Openness::Open(Some(def)) => {
            let mut def = (**def).clone();
            def.path = join(&def.path, &key);
            entry.validate(&def, ctx)?
        }
    };
    if let Some(value) = value {
        extras.insert(key, value);
    }
    Ok(())
}

fn join(parent: &str, key: &str) -> String {
    match parent.rsplit_once('.') {
        Some((prefix, _)) => format!("{}.{}", prefix, key),
        None => key.to_string(),
    }
}

fn duplicate(key: &str, range: Option<PositionRange>) -> Error {
    Error::validation(
        ErrorCode::DuplicateMember,
        format!("'{}' is given more than once", key),
        range,
    )
}

fn attach(error: Error, range: Option<PositionRange>) -> Error {
    match range {
        Some(range) => error.with_range(range),
        None => error,
    }
}

/// Converts a node to a value without a schema. Variables are resolved,
/// positional members are keyed by index, and empty members are dropped.
///
/// # Errors
///
/// Unresolvable variables, duplicate keys, or an error node.
pub(crate) fn node_to_value(node: &Node, ctx: &mut ResolutionContext<'_>) -> Result<Value> {
    match node {
        Node::Token(t) => match t.token.kind {
            TokenKind::Variable => ctx
                .resolve_var(&t.token.raw)
                .map_err(|e| e.with_range(t.token.range)),
            _ => Ok(t.token.value.clone().unwrap_or(Value::Null)),
        },
        Node::Object(obj) => {
            let mut map = ObjectMap::new();
            for (i, member) in obj.members.iter().enumerate() {
                let Some(value) = &member.value else {
                    continue;
                };
                let key = member
                    .key_text()
                    .map_or_else(|| i.to_string(), str::to_string);
                if map.contains_key(&key) {
                    return Err(duplicate(&key, Some(member.range)));
                }
                let value = node_to_value(value, ctx)?;
                map.insert(key, value);
            }
            Ok(Value::Object(map))
        }
        Node::Array(arr) => arr
            .elements
            .iter()
            .map(|e| node_to_value(e, ctx))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Node::Collection(col) => col
            .items
            .iter()
            .map(|e| node_to_value(e, ctx))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Node::Error(err) => Err(err.error.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use crate::{Number, ParseOptions};

    fn run(src: &str) -> Document {
        let options = ParseOptions::default();
        process_document(parse_document(src, &options).unwrap(), None, &options).unwrap()
    }

    fn first_error(src: &str) -> ErrorCode {
        let doc = run(src);
        doc.errors()[0].code()
    }

    #[test]
    fn test_positional_then_keyed() {
        let doc = run("a, b, c\n---\n1, c: 3, b: 2");
        let value = doc.to_value();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["a", "b", "c"]);
        assert_eq!(value.get("b"), Some(&Value::Number(Number::Integer(2))));
    }

    #[test]
    fn test_closed_schema_rejects_extras() {
        assert_eq!(
            first_error("a\n---\n1, 2"),
            ErrorCode::AdditionalValuesNotAllowed
        );
        assert_eq!(first_error("a\n---\n1, z: 2"), ErrorCode::UnknownMember);
    }

    #[test]
    fn test_trailing_empty_members_are_ignored() {
        let doc = run("a\n---\n1, ,");
        assert!(doc.is_valid());
    }

    #[test]
    fn test_open_schema_keeps_extras() {
        let doc = run("a, *\n---\n1, 2, z: x");
        let value = doc.to_value();
        assert_eq!(value.get("1"), Some(&Value::Number(Number::Integer(2))));
        assert_eq!(value.get("z"), Some(&Value::from("x")));
    }

    #[test]
    fn test_typed_extras() {
        assert!(run("a, *: int\n---\n1, z: 2").is_valid());
        assert_eq!(first_error("a, *: int\n---\n1, z: x"), ErrorCode::TypeMismatch);
    }

    #[test]
    fn test_duplicate_member() {
        assert_eq!(first_error("a, b\n---\n1, a: 2"), ErrorCode::DuplicateMember);
    }

    #[test]
    fn test_missing_required_member() {
        let doc = run("a, b\n---\n1");
        let err = &doc.errors()[0];
        assert_eq!(err.code(), ErrorCode::ValueRequired);
        assert!(err.range().is_some());
    }

    #[test]
    fn test_defaults_fill_missing_members() {
        let doc = run("a, b?: {int, default: 7}, c?*: {string, default: N}\n---\n1");
        let value = doc.to_value();
        assert_eq!(value.get("b"), Some(&Value::Number(Number::Integer(7))));
        assert_eq!(value.get("c"), Some(&Value::Null));
    }

    #[test]
    fn test_collection_items_are_isolated() {
        let doc = run("name, age: int\n---\n~ Ann, 30\n~ Bob, old\n~ Cy, 40");
        let col = doc.sections()[0].collection().unwrap();
        assert_eq!(col.len(), 3);
        assert!(col.items()[0].is_valid());
        assert!(!col.items()[1].is_valid());
        assert!(col.items()[2].is_valid());
        assert_eq!(doc.errors().len(), 1);
    }

    #[test]
    fn test_unknown_section_schema() {
        let doc = run("~ @a: 1\n--- $missing\nx");
        assert!(matches!(doc.sections()[0].data, SectionData::Error(_)));
        assert_eq!(doc.errors()[0].code(), ErrorCode::SchemaNotDefined);
    }

    #[test]
    fn test_strict_mode_fails_fast() {
        let options = ParseOptions::new().with_strict(true);
        let ast = parse_document("a: int\n---\n~ 1\n~ x", &options).unwrap();
        let err = process_document(ast, None, &options).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TypeMismatch);
    }

    #[test]
    fn test_loose_conversion() {
        let doc = run("a, b: [1, 2], c: {d: T}");
        let value = doc.to_value();
        assert_eq!(value.get("0"), Some(&Value::from("a")));
        assert_eq!(
            value.get("b"),
            Some(&Value::Array(vec![Value::from(1), Value::from(2)]))
        );
        assert_eq!(value.get("c").and_then(|c| c.get("d")), Some(&Value::Bool(true)));
    }
}
