//! Header definitions: `@variables`, `$schemas` and plain metadata keys.
//!
//! A header collection such as
//!
//! ```text
//! ~ @r: red
//! ~ $address: {street, city}
//! ~ $schema: {name, address: $address}
//! ---
//! ```
//!
//! becomes an ordered [`Definitions`] registry. Schemas are compiled when the
//! registry is built, but references between them (and between variables)
//! stay symbolic until a [`ResolutionContext`](crate::resolve::ResolutionContext)
//! looks them up during validation, so definitions may refer to each other in
//! any order and schemas may be recursive.
//!
//! ```rust
//! use internet_object::parse_definitions;
//!
//! let defs = parse_definitions("~ @r: red\n~ $color: {name, hex?}").unwrap();
//! assert!(defs.contains("@r"));
//! assert!(defs.schema("$color").is_some());
//! ```

use crate::ast::{Node, ObjectNode, SectionNode};
use crate::schema::{compile_object, Schema};
use crate::{Error, ErrorCode, Result};
use indexmap::IndexMap;
use std::sync::Arc;

/// Name of the default schema applied to sections without one.
pub const DEFAULT_SCHEMA: &str = "$schema";

/// A registered definition.
#[derive(Clone, Debug)]
pub enum Definition {
    /// A literal value or a reference to another definition.
    Value(Node),
    Schema(Arc<Schema>),
}

/// Ordered mapping of sigiled names to definitions.
#[derive(Clone, Debug, Default)]
pub struct Definitions {
    entries: IndexMap<String, Definition>,
}

impl Definitions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&mut self, name: impl Into<String>, node: Node) {
        self.entries.insert(name.into(), Definition::Value(node));
    }

    pub fn set_schema(&mut self, name: impl Into<String>, schema: Schema) {
        self.entries
            .insert(name.into(), Definition::Schema(Arc::new(schema)));
    }

    /// Looks up `name` (with its sigil).
    ///
    /// # Errors
    ///
    /// `schemaNotDefined` for `$` names, `variableNotDefined` otherwise. The
    /// error has no range; callers attach the referencing token's.
    pub fn get(&self, name: &str) -> Result<&Definition> {
        self.entries.get(name).ok_or_else(|| {
            let code = if name.starts_with('$') {
                ErrorCode::SchemaNotDefined
            } else {
                ErrorCode::VariableNotDefined
            };
            Error::reference(code, format!("'{}' is not defined", name), None)
        })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// A compiled schema registered directly under `name`.
    #[must_use]
    pub fn schema(&self, name: &str) -> Option<Arc<Schema>> {
        match self.entries.get(name) {
            Some(Definition::Schema(schema)) => Some(Arc::clone(schema)),
            _ => None,
        }
    }

    #[must_use]
    pub fn default_schema(&self) -> Option<Arc<Schema>> {
        self.schema(DEFAULT_SCHEMA)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Definition)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds every entry of `other` not already defined here.
    pub fn merge(&mut self, other: &Definitions) {
        for (name, def) in &other.entries {
            if !self.entries.contains_key(name) {
                self.entries.insert(name.clone(), def.clone());
            }
        }
    }

    /// Builds the registry from a parsed header section.
    ///
    /// Schema definitions that fail to compile are recorded in `errors` and
    /// left out, so a later reference reports `schemaNotDefined`.
    pub fn from_header(header: &SectionNode, errors: &mut Vec<Error>) -> Definitions {
        let mut defs = Definitions::new();
        match &header.child {
            None => {}
            Some(Node::Collection(collection)) => {
                for item in &collection.items {
                    match item {
                        Node::Object(obj) => defs.add_members(obj, errors),
                        // Already recorded by the parser.
                        Node::Error(_) => {}
                        other => errors.push(Error::schema(
                            ErrorCode::InvalidSchema,
                            format!("expected a definition, found {}", other.describe()),
                            Some(other.range()),
                        )),
                    }
                }
            }
            // Recorded by the parser.
            Some(Node::Error(_)) => {}
            Some(Node::Object(obj)) if is_definition_object(obj) => defs.add_members(obj, errors),
            Some(Node::Object(obj)) => match compile_object(obj, Some(DEFAULT_SCHEMA), "") {
                Ok(schema) => defs.set_schema(DEFAULT_SCHEMA, schema),
                Err(err) => errors.push(err),
            },
            Some(other) => errors.push(Error::schema(
                ErrorCode::InvalidSchema,
                format!("unexpected {} in header", other.describe()),
                Some(other.range()),
            )),
        }
        tracing::debug!(definitions = defs.len(), "built definitions");
        defs
    }

    fn add_members(&mut self, obj: &ObjectNode, errors: &mut Vec<Error>) {
        for member in &obj.members {
            let (Some(name), Some(value)) = (member.key_text(), &member.value) else {
                if member.value.is_some() {
                    errors.push(Error::schema(
                        ErrorCode::InvalidSchema,
                        "header definitions must be keyed",
                        Some(member.range),
                    ));
                }
                continue;
            };
            if !name.starts_with('$') {
                self.set_value(name, value.clone());
                continue;
            }
            match value {
                Node::Object(schema_obj) => match compile_object(schema_obj, Some(name), "") {
                    Ok(schema) => self.set_schema(name, schema),
                    Err(err) => errors.push(err),
                },
                // `$alias: $other` is resolved lazily like a variable.
                Node::Token(_) => self.set_value(name, value.clone()),
                other => errors.push(Error::schema(
                    ErrorCode::InvalidSchema,
                    format!("schema '{}' must be an object, found {}", name, other.describe()),
                    Some(other.range()),
                )),
            }
        }
    }
}

/// A header object whose keys carry sigils holds definitions rather than the
/// default schema.
fn is_definition_object(obj: &ObjectNode) -> bool {
    obj.members.iter().any(|m| {
        m.key_text()
            .map_or(false, |k| k.starts_with('$') || k.starts_with('@'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use crate::ParseOptions;

    fn header_defs(src: &str) -> (Definitions, Vec<Error>) {
        let doc = parse_document(src, &ParseOptions::default()).unwrap();
        let mut errors = Vec::new();
        let defs = Definitions::from_header(doc.header.as_ref().unwrap(), &mut errors);
        (defs, errors)
    }

    #[test]
    fn test_collection_header() {
        let (defs, errors) = header_defs("~ @r: red\n~ $address: {street, city}\n~ version: 2\n---\n");
        assert!(errors.is_empty());
        assert_eq!(defs.len(), 3);
        assert!(matches!(defs.get("@r"), Ok(Definition::Value(_))));
        assert!(defs.schema("$address").is_some());
        assert!(defs.contains("version"));
    }

    #[test]
    fn test_plain_header_is_default_schema() {
        let (defs, _) = header_defs("name, age: int\n---\nBob, 3");
        let schema = defs.default_schema().unwrap();
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_missing_names() {
        let defs = Definitions::new();
        assert_eq!(defs.get("@x").unwrap_err().code(), ErrorCode::VariableNotDefined);
        assert_eq!(defs.get("$x").unwrap_err().code(), ErrorCode::SchemaNotDefined);
    }

    #[test]
    fn test_bad_schema_is_recorded_and_skipped() {
        let (defs, errors) = header_defs("~ $a: {x: int64}\n~ @b: 1\n---\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), ErrorCode::NotSupported);
        assert!(!defs.contains("$a"));
        assert!(defs.contains("@b"));
    }

    #[test]
    fn test_merge_keeps_existing() {
        let (mut defs, _) = header_defs("~ @a: 1\n---\n");
        let (other, _) = header_defs("~ @a: 2\n~ @b: 3\n---\n");
        defs.merge(&other);
        assert_eq!(defs.len(), 2);
        match defs.get("@a").unwrap() {
            Definition::Value(node) => assert_eq!(node.to_string(), "1"),
            other => panic!("expected value, got {:?}", other),
        }
    }
}
