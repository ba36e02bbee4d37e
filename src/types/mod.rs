//! Type validators.
//!
//! Every schema type is a [`TypeDef`] registered in a [`TypeRegistry`]. The
//! registry is built once and only read afterwards; [`TypeRegistry::global`]
//! returns the shared built-in table, and callers may also build their own
//! and pass it by reference.
//!
//! ## Validation order
//!
//! [`TypeDef::parse`] and [`TypeDef::load`] run the shared checks first:
//!
//! 1. a missing value takes the member's `default`, is omitted when the
//!    member is optional, and otherwise fails with `valueRequired`;
//! 2. `@variable` inputs are resolved through the run's
//!    [`ResolutionContext`];
//! 3. null is accepted only for nullable members (`nullNotAllowed`);
//! 4. `choices` are resolved once per field and checked (`invalidChoice`).
//!
//! Only then does [`TypeDef::validate`] run the type's own checks. Each
//! validator stops at the first violated constraint.

mod any;
mod array;
mod base64;
mod bigint;
mod boolean;
mod common;
mod datetime;
mod decimal;
mod number;
mod object;
mod string;

use crate::ast::Node;
use crate::position::PositionRange;
use crate::resolve::ResolutionContext;
use crate::schema::{MemberDef, TypeName};
use crate::{Error, ErrorCode, Result, Value};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) use common::check;

static BUILTIN: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::with_builtins);

/// A value handed to a validator: a syntax node from parsed text, or an
/// already materialized value (a resolved variable or a loaded host value).
#[derive(Clone, Copy, Debug)]
pub enum Input<'a> {
    Node(&'a Node),
    Value(&'a Value, Option<PositionRange>),
}

impl<'a> Input<'a> {
    #[must_use]
    pub fn range(&self) -> Option<PositionRange> {
        match self {
            Input::Node(node) => Some(node.range()),
            Input::Value(_, range) => *range,
        }
    }

    /// The decoded scalar and, for tokens, the lexeme as written.
    #[must_use]
    pub fn scalar(&self) -> Option<(&'a Value, Option<&'a str>)> {
        match *self {
            Input::Node(Node::Token(t)) => t
                .token
                .value
                .as_ref()
                .map(|v| (v, Some(t.token.raw.as_str()))),
            Input::Node(_) => None,
            Input::Value(value, _) => Some((value, None)),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self.scalar(), Some((Value::Null, _)))
    }

    /// Short description for mismatch messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Input::Node(node) => node.describe(),
            Input::Value(value, _) => value.kind_name().to_string(),
        }
    }
}

/// Validation and rendering for one schema type.
pub trait TypeDef: Send + Sync {
    fn name(&self) -> TypeName;

    /// Type-specific checks for a present, non-null, dereferenced input.
    fn validate(
        &self,
        input: Input<'_>,
        def: &MemberDef,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Value>;

    /// Renders a validated value as Internet Object text.
    fn stringify(
        &self,
        value: &Value,
        _def: &MemberDef,
        _ctx: &mut ResolutionContext<'_>,
    ) -> Result<String> {
        Ok(value.to_string())
    }

    /// Validates a parsed node. `Ok(None)` means the member is omitted.
    fn parse(
        &self,
        node: Option<&Node>,
        def: &MemberDef,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Option<Value>> {
        check(self, node.map(Input::Node), def, ctx)
    }

    /// Validates a host value.
    fn load(
        &self,
        value: Option<&serde_json::Value>,
        def: &MemberDef,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Option<Value>> {
        let converted = value.map(Value::from);
        check(self, converted.as_ref().map(|v| Input::Value(v, None)), def, ctx)
    }
}

/// Immutable table of type validators.
pub struct TypeRegistry {
    types: HashMap<TypeName, Arc<dyn TypeDef>>,
}

impl TypeRegistry {
    /// A registry holding every built-in type.
    #[must_use]
    pub fn with_builtins() -> Self {
        let builtins: Vec<Arc<dyn TypeDef>> = vec![
            Arc::new(any::AnyDef),
            Arc::new(string::StringDef::new(TypeName::String)),
            Arc::new(string::StringDef::new(TypeName::Email)),
            Arc::new(string::StringDef::new(TypeName::Url)),
            Arc::new(number::NumberDef::new(TypeName::Number)),
            Arc::new(number::NumberDef::new(TypeName::Int)),
            Arc::new(number::NumberDef::new(TypeName::UInt)),
            Arc::new(number::NumberDef::new(TypeName::Int8)),
            Arc::new(number::NumberDef::new(TypeName::UInt8)),
            Arc::new(number::NumberDef::new(TypeName::Int16)),
            Arc::new(number::NumberDef::new(TypeName::UInt16)),
            Arc::new(number::NumberDef::new(TypeName::Int32)),
            Arc::new(number::NumberDef::new(TypeName::UInt32)),
            Arc::new(bigint::BigIntDef),
            Arc::new(decimal::DecimalDef),
            Arc::new(boolean::BoolDef),
            Arc::new(datetime::DateTimeDef::new(TypeName::Date)),
            Arc::new(datetime::DateTimeDef::new(TypeName::Time)),
            Arc::new(datetime::DateTimeDef::new(TypeName::DateTime)),
            Arc::new(base64::Base64Def),
            Arc::new(array::ArrayDef),
            Arc::new(object::ObjectDef),
        ];
        let types = builtins.into_iter().map(|t| (t.name(), t)).collect();
        TypeRegistry { types }
    }

    /// The shared built-in registry.
    #[must_use]
    pub fn global() -> &'static TypeRegistry {
        &BUILTIN
    }

    /// # Errors
    ///
    /// `notSupported` when no validator is registered for `name`.
    pub fn get(&self, name: TypeName) -> Result<&dyn TypeDef> {
        self.types.get(&name).map(|t| t.as_ref()).ok_or_else(|| {
            Error::schema(
                ErrorCode::NotSupported,
                format!("no validator registered for '{}'", name),
                None,
            )
        })
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Validates a parsed node against `def` through the context's registry.
pub fn parse_member(
    node: Option<&Node>,
    def: &MemberDef,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Option<Value>> {
    let registry = ctx.registry();
    registry.get(def.type_name)?.parse(node, def, ctx)
}

/// Validates a host value against `def` through the context's registry.
pub fn load_member(
    value: Option<&serde_json::Value>,
    def: &MemberDef,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Option<Value>> {
    let registry = ctx.registry();
    registry.get(def.type_name)?.load(value, def, ctx)
}

/// Validates an in-memory value against `def`.
pub(crate) fn check_member(
    value: Option<&Value>,
    range: Option<PositionRange>,
    def: &MemberDef,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Option<Value>> {
    let registry = ctx.registry();
    check(
        registry.get(def.type_name)?,
        value.map(|v| Input::Value(v, range)),
        def,
        ctx,
    )
}

/// Renders `value` with the validator for `def`.
pub fn stringify_member(
    value: &Value,
    def: &MemberDef,
    ctx: &mut ResolutionContext<'_>,
) -> Result<String> {
    let registry = ctx.registry();
    registry.get(def.type_name)?.stringify(value, def, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_is_registered() {
        let registry = TypeRegistry::global();
        for name in TypeName::ALL {
            assert_eq!(registry.get(name).unwrap().name(), name);
        }
    }
}
