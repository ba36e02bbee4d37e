//! The validated document model.
//!
//! A [`Document`] holds the header [`Definitions`], one [`Section`] per data
//! block, and every error recovered along the way. A collection keeps a slot
//! for each `~` item, so a bad item shows up as a [`CollectionItem::Error`]
//! in place while its siblings stay valid.
//!
//! ```rust
//! use internet_object::{parse, CollectionItem};
//!
//! let doc = parse("name, age: int\n---\n~ Ann, 30\n~ Bob, old").unwrap();
//! let items = doc.sections()[0].collection().unwrap().items();
//! assert!(matches!(items[0], CollectionItem::Valid(_)));
//! assert!(matches!(items[1], CollectionItem::Error(_)));
//! assert_eq!(doc.errors().len(), 1);
//! ```

use crate::ast::ErrorNode;
use crate::definitions::Definitions;
use crate::schema::Schema;
use crate::{Error, ErrorCode, ObjectMap, Result, Value};
use std::sync::Arc;

/// A parsed and validated document.
#[derive(Clone, Debug)]
pub struct Document {
    definitions: Definitions,
    sections: Vec<Section>,
    errors: Vec<Error>,
}

impl Document {
    pub(crate) fn new(definitions: Definitions, sections: Vec<Section>, errors: Vec<Error>) -> Self {
        Document {
            definitions,
            sections,
            errors,
        }
    }

    #[must_use]
    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The first section called `name`.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.name.as_deref() == Some(name))
    }

    /// Every recovered error, in document order.
    #[must_use]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Plain data view. A single section yields its own value; several yield
    /// an object keyed by section name (or index when unnamed). Failed
    /// collection items are skipped.
    #[must_use]
    pub fn to_value(&self) -> Value {
        if self.sections.len() == 1 {
            return self.sections[0].data.to_value();
        }
        let map: ObjectMap = self
            .sections
            .iter()
            .enumerate()
            .map(|(i, s)| (s.key(i), s.data.to_value()))
            .collect();
        Value::Object(map)
    }

    /// JSON view. Failed collection items appear as
    /// `{"__error": {"code": ..., "message": ...}}` so item positions are kept.
    ///
    /// # Errors
    ///
    /// `conversionFailed` if a value cannot be represented as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        if self.sections.len() == 1 {
            return self.sections[0].data.to_json();
        }
        let mut map = serde_json::Map::with_capacity(self.sections.len());
        for (i, section) in self.sections.iter().enumerate() {
            map.insert(section.key(i), section.data.to_json()?);
        }
        Ok(serde_json::Value::Object(map))
    }
}

/// One data section.
#[derive(Clone, Debug)]
pub struct Section {
    pub name: Option<String>,
    /// The schema reference written in the section header, if any.
    pub schema_name: Option<String>,
    /// The schema the data was validated against.
    pub schema: Option<Arc<Schema>>,
    pub data: SectionData,
}

impl Section {
    /// The section's collection, if it holds one.
    #[must_use]
    pub fn collection(&self) -> Option<&Collection> {
        match &self.data {
            SectionData::Collection(c) => Some(c),
            _ => None,
        }
    }

    fn key(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| index.to_string())
    }
}

#[derive(Clone, Debug)]
pub enum SectionData {
    Empty,
    Value(Value),
    Collection(Collection),
    /// The section could not be validated at all.
    Error(ErrorNode),
}

impl SectionData {
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            SectionData::Empty | SectionData::Error(_) => Value::Null,
            SectionData::Value(v) => v.clone(),
            SectionData::Collection(c) => Value::Array(c.values().cloned().collect()),
        }
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        match self {
            SectionData::Empty => Ok(serde_json::Value::Null),
            SectionData::Value(v) => value_to_json(v),
            SectionData::Error(e) => Ok(error_json(&e.error)),
            SectionData::Collection(c) => c
                .items
                .iter()
                .map(|item| match item {
                    CollectionItem::Valid(v) => value_to_json(v),
                    CollectionItem::Error(e) => Ok(error_json(&e.error)),
                })
                .collect::<Result<Vec<_>>>()
                .map(serde_json::Value::Array),
        }
    }
}

/// Items of a `~` collection, one slot per item.
#[derive(Clone, Debug, Default)]
pub struct Collection {
    items: Vec<CollectionItem>,
}

impl Collection {
    pub(crate) fn new(items: Vec<CollectionItem>) -> Self {
        Collection { items }
    }

    #[must_use]
    pub fn items(&self) -> &[CollectionItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Values of the valid items.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.items.iter().filter_map(|item| match item {
            CollectionItem::Valid(v) => Some(v),
            CollectionItem::Error(_) => None,
        })
    }

    /// Errors of the failed items.
    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.items.iter().filter_map(|item| match item {
            CollectionItem::Error(e) => Some(&e.error),
            CollectionItem::Valid(_) => None,
        })
    }
}

#[derive(Clone, Debug)]
pub enum CollectionItem {
    Valid(Value),
    Error(ErrorNode),
}

impl CollectionItem {
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, CollectionItem::Valid(_))
    }
}

fn value_to_json(value: &Value) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| {
        Error::validation(ErrorCode::ConversionFailed, e.to_string(), None)
    })
}

fn error_json(error: &Error) -> serde_json::Value {
    serde_json::json!({
        "__error": {
            "code": error.code().as_str(),
            "message": error.message(),
        }
    })
}
