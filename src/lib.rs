//! # internet_object
//!
//! A parser and schema validator for the Internet Object text format.
//!
//! ## What is Internet Object?
//!
//! Internet Object is a compact, schema-first serialization format. Data is
//! written positionally, like a CSV row, and a schema in the document header
//! gives the values their names and types:
//!
//! ```text
//! ~ @r: red
//! ~ $schema: {name, age: {int, min: 0}, color?: {string, choices: [@r, green]}}
//! ---
//! ~ Ann, 30, @r
//! ~ Bob, 41
//! ```
//!
//! ## Pipeline
//!
//! Text goes through four stages:
//!
//! 1. [`tokenizer`]: source text to tokens, each with a row/column range;
//! 2. [`parser`]: tokens to a syntax tree, recovering from errors at
//!    collection item boundaries;
//! 3. [`definitions`] and [`schema`]: the header becomes a registry of
//!    variables and compiled schemas, resolved lazily by [`resolve`];
//! 4. [`processor`] and [`types`]: each section is validated against its
//!    schema, producing a [`Document`].
//!
//! A bad collection item never takes its siblings down with it: the item is
//! replaced by an error slot and the error is listed in
//! [`Document::errors`]. A syntax error elsewhere in a section costs only
//! that section when another `---` follows. Errors with no boundary left to
//! resume at, and every error in strict mode, fail the whole parse.
//!
//! ## Quick Start
//!
//! ```rust
//! use internet_object::{parse, ErrorCode, Value};
//!
//! let text = "\
//! ~ @r: red
//! ~ $schema: {name, age: {int, min: 0}, color?: {string, choices: [@r, green]}}
//! ---
//! ~ Ann, 30, @r
//! ~ Bob, -4
//! ~ Cy, 22, green";
//!
//! let doc = parse(text).unwrap();
//! let people = doc.to_value();
//! let people = people.as_array().unwrap();
//! assert_eq!(people.len(), 2);
//! assert_eq!(people[0].get("color"), Some(&Value::from("red")));
//! assert_eq!(doc.errors()[0].code(), ErrorCode::OutOfRange);
//! ```
//!
//! ### Typed data
//!
//! Validated values deserialize into Rust types through Serde:
//!
//! ```rust
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! let points: Vec<Point> = internet_object::from_str("x: int, y: int\n---\n~ 1, 2\n~ 3, 4").unwrap();
//! assert_eq!(points[1], Point { x: 3, y: 4 });
//! ```
//!
//! ### Host values
//!
//! JSON values can be validated against a schema as well:
//!
//! ```rust
//! use internet_object::{compile_schema, load, ErrorCode};
//! use serde_json::json;
//!
//! let schema = compile_schema("name, age: {int, min: 0}").unwrap();
//! assert!(load(&json!({"name": "Ann", "age": 30}), &schema).is_ok());
//! let err = load(&json!({"name": "Bob", "age": -1}), &schema).unwrap_err();
//! assert_eq!(err.code(), ErrorCode::OutOfRange);
//! ```
//!
//! ## Logging
//!
//! Stage boundaries emit `tracing` events at `debug` level and reference
//! resolution at `trace` level. Install any `tracing` subscriber to see them.

pub mod ast;
pub mod de;
pub mod definitions;
pub mod document;
pub mod error;
pub mod error_range;
pub mod macros;
pub mod map;
pub mod options;
pub mod parser;
pub mod position;
pub mod processor;
pub mod resolve;
pub mod schema;
pub mod ser;
pub mod token;
pub mod tokenizer;
pub mod types;
pub mod value;

pub use de::{from_value, ValueDeserializer};
pub use definitions::{Definition, Definitions};
pub use document::{Collection, CollectionItem, Document, Section, SectionData};
pub use error::{Error, ErrorCategory, ErrorCode, Result};
pub use map::ObjectMap;
pub use options::{ParseOptions, StringifyOptions};
pub use position::{Position, PositionRange};
pub use schema::{MemberDef, Schema, TypeName};
pub use ser::{stringify, stringify_value, to_value, ValueSerializer};
pub use value::{Number, Value};

use resolve::ResolutionContext;
use schema::SchemaSlot;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use types::TypeRegistry;

/// Parses and validates a document with default options.
///
/// # Examples
///
/// ```rust
/// use internet_object::parse;
///
/// let doc = parse("a: 1, b: [T, F]").unwrap();
/// assert!(doc.is_valid());
/// ```
///
/// # Errors
///
/// Tokenizer errors, and syntax errors with no later `~` or `---` to
/// resume at.
pub fn parse(input: &str) -> Result<Document> {
    parse_with_options(input, &ParseOptions::default())
}

/// Parses and validates a document.
///
/// # Errors
///
/// As [`parse`]; in strict mode also the first recovered error.
pub fn parse_with_options(input: &str, options: &ParseOptions) -> Result<Document> {
    let ast = parser::parse_document(input, options)?;
    processor::process_document(ast, None, options)
}

/// Parses a document using externally supplied definitions for names its
/// own header does not define.
///
/// ```rust
/// use internet_object::{parse_definitions, parse_with_definitions, ParseOptions};
///
/// let defs = parse_definitions("~ $schema: {name, age: int}").unwrap();
/// let doc = parse_with_definitions("Ann, 30", &defs, &ParseOptions::default()).unwrap();
/// assert!(doc.to_value().get("age").is_some());
/// ```
///
/// # Errors
///
/// As [`parse_with_options`].
pub fn parse_with_definitions(
    input: &str,
    definitions: &Definitions,
    options: &ParseOptions,
) -> Result<Document> {
    let ast = parser::parse_document(input, options)?;
    processor::process_document(ast, Some(definitions), options)
}

/// Parses standalone definitions, written like a document header. Text
/// without a `---` is read as the header itself.
///
/// # Errors
///
/// The first syntax or schema error.
pub fn parse_definitions(input: &str) -> Result<Definitions> {
    let options = ParseOptions::default();
    let mut doc = parser::parse_document(input, &options)?;
    if let Some(first) = doc.errors.first() {
        return Err(first.clone());
    }
    let header = match doc.header.take() {
        Some(header) => header,
        None if doc.sections.is_empty() => return Ok(Definitions::new()),
        None => doc.sections.remove(0),
    };
    let mut errors = Vec::new();
    let defs = Definitions::from_header(&header, &mut errors);
    match errors.into_iter().next() {
        Some(first) => Err(first),
        None => Ok(defs),
    }
}

/// Compiles schema text such as `name, age?: int`.
///
/// # Errors
///
/// `invalidSchema`, `invalidType`, `invalidConstraint` or `notSupported`.
pub fn compile_schema(source: &str) -> Result<Schema> {
    Schema::compile(source)
}

/// Validates a JSON value against `schema`.
///
/// # Errors
///
/// The first validation error.
pub fn load(value: &serde_json::Value, schema: &Schema) -> Result<Value> {
    load_with_definitions(value, schema, &Definitions::new())
}

/// Validates a JSON value against `schema`, resolving references through
/// `definitions`.
///
/// # Errors
///
/// The first validation error.
pub fn load_with_definitions(
    value: &serde_json::Value,
    schema: &Schema,
    definitions: &Definitions,
) -> Result<Value> {
    let mut ctx = ResolutionContext::new(definitions, TypeRegistry::global());
    let def = object_def(schema);
    let loaded = types::load_member(Some(value), &def, &mut ctx)?;
    Ok(loaded.unwrap_or(Value::Null))
}

/// Validates each element of a JSON array against `schema`. Like a parsed
/// collection, failing elements become error slots.
///
/// # Errors
///
/// `typeMismatch` when `value` is not an array.
pub fn load_collection(value: &serde_json::Value, schema: &Schema) -> Result<Collection> {
    let serde_json::Value::Array(items) = value else {
        return Err(Error::validation(
            ErrorCode::TypeMismatch,
            "expected an array of objects",
            None,
        ));
    };
    let definitions = Definitions::new();
    let mut ctx = ResolutionContext::new(&definitions, TypeRegistry::global());
    let def = object_def(schema);
    let loaded = items
        .iter()
        .enumerate()
        .map(|(i, item)| match types::load_member(Some(item), &def, &mut ctx) {
            Ok(value) => CollectionItem::Valid(value.unwrap_or(Value::Null)),
            Err(error) => {
                tracing::debug!(index = i, code = %error.code(), "collection item failed");
                let range = error.range().unwrap_or_default();
                CollectionItem::Error(ast::ErrorNode { error, range })
            }
        })
        .collect();
    Ok(Collection::new(loaded))
}

fn object_def(schema: &Schema) -> MemberDef {
    let mut def = MemberDef::new(TypeName::Object, "");
    def.schema = Some(SchemaSlot::Inline(Arc::new(schema.clone())));
    def
}

/// Parses a document in strict mode and deserializes its data into `T`.
///
/// # Errors
///
/// Any parse or validation error, or `conversionFailed` when the data does
/// not have the shape `T` expects.
pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    let doc = parse_with_options(input, &ParseOptions::new().with_strict(true))?;
    from_value(doc.to_value())
}
