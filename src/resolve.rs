//! Lazy, cached, cycle-guarded resolution of `@variable` and `$schema`
//! references.
//!
//! A [`ResolutionContext`] lives for exactly one validation run. It borrows
//! the run's [`Definitions`] and the read-only [`TypeRegistry`], and owns its
//! caches and guard sets, so two runs never share mutable state.
//!
//! Resolving a name that is already being resolved means the definitions
//! loop (`@a: @b`, `@b: @a`) and yields `circularReference`. The guard only
//! covers the lookup itself: once a schema is resolved it is cached, so a
//! schema whose members refer back to it validates recursive data without
//! tripping the guard.
//!
//! ```rust
//! use internet_object::{parse_definitions, ErrorCode};
//! use internet_object::resolve::ResolutionContext;
//! use internet_object::types::TypeRegistry;
//!
//! let defs = parse_definitions("~ @a: @b\n~ @b: @a").unwrap();
//! let mut ctx = ResolutionContext::new(&defs, TypeRegistry::global());
//! let err = ctx.resolve_var("a").unwrap_err();
//! assert_eq!(err.code(), ErrorCode::CircularReference);
//! ```

use crate::ast::Node;
use crate::definitions::{Definition, Definitions};
use crate::processor::node_to_value;
use crate::schema::{compile_object, Schema};
use crate::token::TokenKind;
use crate::types::TypeRegistry;
use crate::{Error, ErrorCode, Result, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Per-run resolution state.
pub struct ResolutionContext<'d> {
    defs: &'d Definitions,
    registry: &'d TypeRegistry,
    vars: HashMap<String, Value>,
    schemas: HashMap<String, Arc<Schema>>,
    choices: HashMap<String, Arc<HashSet<String>>>,
    resolving_vars: HashSet<String>,
    resolving_schemas: HashSet<String>,
}

impl<'d> ResolutionContext<'d> {
    pub fn new(defs: &'d Definitions, registry: &'d TypeRegistry) -> Self {
        ResolutionContext {
            defs,
            registry,
            vars: HashMap::new(),
            schemas: HashMap::new(),
            choices: HashMap::new(),
            resolving_vars: HashSet::new(),
            resolving_schemas: HashSet::new(),
        }
    }

    #[must_use]
    pub fn definitions(&self) -> &'d Definitions {
        self.defs
    }

    #[must_use]
    pub fn registry(&self) -> &'d TypeRegistry {
        self.registry
    }

    /// Resolves a variable, given with or without its `@`.
    ///
    /// # Errors
    ///
    /// `variableNotDefined`, `circularReference`, or any error raised while
    /// resolving references nested in the variable's value.
    pub fn resolve_var(&mut self, name: &str) -> Result<Value> {
        let key = if name.starts_with('@') {
            name.to_string()
        } else {
            format!("@{}", name)
        };
        if let Some(value) = self.vars.get(&key) {
            tracing::trace!(name = %key, "variable cache hit");
            return Ok(value.clone());
        }
        if !self.resolving_vars.insert(key.clone()) {
            return Err(circular(&key));
        }
        tracing::trace!(name = %key, "resolving variable");
        let result = self.lookup_var(&key);
        self.resolving_vars.remove(&key);

        let value = result?;
        self.vars.insert(key, value.clone());
        Ok(value)
    }

    fn lookup_var(&mut self, key: &str) -> Result<Value> {
        let defs = self.defs;
        match defs.get(key)? {
            Definition::Value(node) => match node {
                Node::Token(t) if t.token.kind == TokenKind::Variable => {
                    let target = t.token.raw.clone();
                    self.resolve_var(&target)
                        .map_err(|e| e.with_range(t.token.range))
                }
                other => node_to_value(other, self),
            },
            Definition::Schema(_) => Err(Error::reference(
                ErrorCode::VariableNotDefined,
                format!("'{}' names a schema, not a value", key),
                None,
            )),
        }
    }

    /// Resolves a schema, given with or without its `$`.
    ///
    /// # Errors
    ///
    /// `schemaNotDefined`, `circularReference`, or `invalidSchema` when the
    /// name is bound to something that is not a schema.
    pub fn resolve_schema(&mut self, name: &str) -> Result<Arc<Schema>> {
        let key = if name.starts_with('$') {
            name.to_string()
        } else {
            format!("${}", name)
        };
        if let Some(schema) = self.schemas.get(&key) {
            tracing::trace!(name = %key, "schema cache hit");
            return Ok(Arc::clone(schema));
        }
        if !self.resolving_schemas.insert(key.clone()) {
            return Err(circular(&key));
        }
        tracing::trace!(name = %key, "resolving schema");
        let result = self.lookup_schema(&key);
        self.resolving_schemas.remove(&key);

        let schema = result?;
        self.schemas.insert(key, Arc::clone(&schema));
        Ok(schema)
    }

    fn lookup_schema(&mut self, key: &str) -> Result<Arc<Schema>> {
        let defs = self.defs;
        match defs.get(key)? {
            Definition::Schema(schema) => Ok(Arc::clone(schema)),
            Definition::Value(Node::Token(t)) if t.token.kind == TokenKind::SchemaRef => {
                let target = t.token.raw.clone();
                self.resolve_schema(&target)
                    .map_err(|e| e.with_range(t.token.range))
            }
            Definition::Value(Node::Object(obj)) => Ok(Arc::new(compile_object(obj, Some(key), "")?)),
            Definition::Value(other) => Err(Error::schema(
                ErrorCode::InvalidSchema,
                format!("'{}' is not a schema", key),
                Some(other.range()),
            )),
        }
    }

    /// Cached choice set for `key`, if already resolved in this run.
    #[must_use]
    pub fn cached_choices(&self, key: &str) -> Option<Arc<HashSet<String>>> {
        let hit = self.choices.get(key).cloned();
        if hit.is_some() {
            tracing::trace!(key, "choices cache hit");
        }
        hit
    }

    pub fn cache_choices(&mut self, key: String, set: HashSet<String>) -> Arc<HashSet<String>> {
        let set = Arc::new(set);
        self.choices.insert(key, Arc::clone(&set));
        set
    }
}

fn circular(name: &str) -> Error {
    Error::reference(
        ErrorCode::CircularReference,
        format!("'{}' refers back to itself", name),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_definitions, Number};

    fn defs(src: &str) -> Definitions {
        parse_definitions(src).unwrap()
    }

    #[test]
    fn test_resolves_chained_variables() {
        let defs = defs("~ @a: @b\n~ @b: 42");
        let mut ctx = ResolutionContext::new(&defs, TypeRegistry::global());
        assert_eq!(ctx.resolve_var("@a").unwrap(), Value::Number(Number::Integer(42)));
        assert_eq!(ctx.resolve_var("b").unwrap(), Value::Number(Number::Integer(42)));
    }

    #[test]
    fn test_variable_cycle() {
        let defs = defs("~ @a: @b\n~ @b: @a");
        let mut ctx = ResolutionContext::new(&defs, TypeRegistry::global());
        let err = ctx.resolve_var("a").unwrap_err();
        assert_eq!(err.code(), ErrorCode::CircularReference);
        // The guard is released, so a second attempt fails the same way.
        assert_eq!(
            ctx.resolve_var("a").unwrap_err().code(),
            ErrorCode::CircularReference
        );
    }

    #[test]
    fn test_self_reference() {
        let defs = defs("~ @a: [1, @a]");
        let mut ctx = ResolutionContext::new(&defs, TypeRegistry::global());
        assert_eq!(
            ctx.resolve_var("a").unwrap_err().code(),
            ErrorCode::CircularReference
        );
    }

    #[test]
    fn test_schema_alias_and_cycle() {
        let defs = defs("~ $a: $b\n~ $b: {x}\n~ $c: $d\n~ $d: $c");
        let mut ctx = ResolutionContext::new(&defs, TypeRegistry::global());
        assert_eq!(ctx.resolve_schema("$a").unwrap().len(), 1);
        assert_eq!(
            ctx.resolve_schema("c").unwrap_err().code(),
            ErrorCode::CircularReference
        );
    }

    #[test]
    fn test_undefined_names() {
        let defs = Definitions::new();
        let mut ctx = ResolutionContext::new(&defs, TypeRegistry::global());
        assert_eq!(
            ctx.resolve_var("nope").unwrap_err().code(),
            ErrorCode::VariableNotDefined
        );
        assert_eq!(
            ctx.resolve_schema("$nope").unwrap_err().code(),
            ErrorCode::SchemaNotDefined
        );
    }

    #[test]
    fn test_recursive_schema_is_cached() {
        let defs = defs("~ $person: {name, friend?: $person}");
        let mut ctx = ResolutionContext::new(&defs, TypeRegistry::global());
        let first = ctx.resolve_schema("$person").unwrap();
        let second = ctx.resolve_schema("$person").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
