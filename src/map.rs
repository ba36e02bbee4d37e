//! Ordered member map for object values.
//!
//! [`ObjectMap`] wraps an [`IndexMap`] so members keep the order in which they
//! were written (or declared by the schema). Member order is significant in
//! Internet Object: positional data is matched to schema members by index.
//!
//! Objects parsed without a schema may contain positional members. Those are
//! stored under their zero-based index rendered as a string (`"0"`, `"1"`, …),
//! which lets [`ObjectMap::is_positional_key`] write them back positionally.
//!
//! ## Examples
//!
//! ```rust
//! use internet_object::{ObjectMap, Value};
//!
//! let mut map = ObjectMap::new();
//! map.insert("name".to_string(), Value::from("Alice"));
//! map.insert("age".to_string(), Value::from(30));
//!
//! let keys: Vec<_> = map.keys().cloned().collect();
//! assert_eq!(keys, vec!["name", "age"]);
//! ```

use indexmap::IndexMap;

/// An insertion-ordered map of member names to values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectMap(IndexMap<String, crate::Value>);

impl ObjectMap {
    #[must_use]
    pub fn new() -> Self {
        ObjectMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ObjectMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a member, returning the previous value for `key` if any.
    ///
    /// Replacing an existing key keeps its original position.
    pub fn insert(&mut self, key: String, value: crate::Value) -> Option<crate::Value> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&crate::Value> {
        self.0.get(key)
    }

    /// Returns the member at `index` in insertion order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&String, &crate::Value)> {
        self.0.get_index(index)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, crate::Value> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, crate::Value> {
        self.0.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, crate::Value> {
        self.0.iter()
    }

    /// `true` when `key` is the synthetic name of the positional member at
    /// `index`.
    #[must_use]
    pub fn is_positional_key(key: &str, index: usize) -> bool {
        key == index.to_string()
    }
}

impl IntoIterator for ObjectMap {
    type Item = (String, crate::Value);
    type IntoIter = indexmap::map::IntoIter<String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ObjectMap {
    type Item = (&'a String, &'a crate::Value);
    type IntoIter = indexmap::map::Iter<'a, String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, crate::Value)> for ObjectMap {
    fn from_iter<T: IntoIterator<Item = (String, crate::Value)>>(iter: T) -> Self {
        ObjectMap(IndexMap::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn test_replace_keeps_position() {
        let mut map = ObjectMap::new();
        map.insert("a".to_string(), Value::from(1));
        map.insert("b".to_string(), Value::from(2));
        assert!(map.insert("a".to_string(), Value::from(3)).is_some());
        assert_eq!(map.get_index(0).map(|(k, _)| k.as_str()), Some("a"));
        assert_eq!(map.get("a"), Some(&Value::from(3)));
    }

    #[test]
    fn test_positional_keys() {
        assert!(ObjectMap::is_positional_key("0", 0));
        assert!(ObjectMap::is_positional_key("3", 3));
        assert!(!ObjectMap::is_positional_key("3", 2));
        assert!(!ObjectMap::is_positional_key("name", 0));
    }
}
