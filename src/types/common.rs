//! Checks shared by every type, plus small helpers for the validators.

use super::{Input, TypeDef};
use crate::ast::Node;
use crate::processor::node_to_value;
use crate::resolve::ResolutionContext;
use crate::schema::MemberDef;
use crate::token::TokenKind;
use crate::{Error, ErrorCode, Result, Value};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Runs the shared checks, then the type's own validation.
pub(crate) fn check<T: TypeDef + ?Sized>(
    td: &T,
    input: Option<Input<'_>>,
    def: &MemberDef,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Option<Value>> {
    let Some(input) = input else {
        return undefined(td, def, ctx);
    };

    if let Input::Node(Node::Token(t)) = input {
        if t.token.kind == TokenKind::Variable {
            let range = t.token.range;
            let value = ctx
                .resolve_var(&t.token.raw)
                .map_err(|e| e.with_range(range))?;
            return check(td, Some(Input::Value(&value, Some(range))), def, ctx);
        }
    }

    if input.is_null() {
        if def.nullable {
            return Ok(Some(Value::Null));
        }
        return Err(Error::validation(
            ErrorCode::NullNotAllowed,
            format!("'{}' does not accept null", def.path),
            input.range(),
        ));
    }

    if def.choices.is_some() {
        check_choices(input, def, ctx)?;
    }

    td.validate(input, def, ctx).map(Some)
}

fn undefined<T: TypeDef + ?Sized>(
    td: &T,
    def: &MemberDef,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Option<Value>> {
    if let Some(default) = &def.default {
        if matches!(default, Node::Token(t) if t.token.kind == TokenKind::Null) {
            return Ok(Some(Value::Null));
        }
        return check(td, Some(Input::Node(default)), def, ctx);
    }
    if def.optional {
        return Ok(None);
    }
    Err(Error::validation(
        ErrorCode::ValueRequired,
        format!("a value is required for '{}'", def.path),
        None,
    ))
}

fn check_choices(input: Input<'_>, def: &MemberDef, ctx: &mut ResolutionContext<'_>) -> Result<()> {
    let Some(choices) = &def.choices else {
        return Ok(());
    };
    let key = format!(
        "{}|{}",
        def.path,
        choices
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    );

    let allowed = match ctx.cached_choices(&key) {
        Some(set) => set,
        None => {
            let mut set = HashSet::with_capacity(choices.len());
            for choice in choices {
                set.insert(node_to_value(choice, ctx)?.choice_key());
            }
            ctx.cache_choices(key, set)
        }
    };

    let value = match input {
        Input::Node(node) => node_to_value(node, ctx)?,
        Input::Value(value, _) => value.clone(),
    };
    if allowed.contains(&value.choice_key()) {
        Ok(())
    } else {
        Err(Error::validation(
            ErrorCode::InvalidChoice,
            format!("{} is not one of the choices for '{}'", value, def.path),
            input.range(),
        ))
    }
}

pub(crate) fn mismatch(expected: &str, input: &Input<'_>, def: &MemberDef) -> Error {
    Error::validation(
        ErrorCode::TypeMismatch,
        format!(
            "'{}' expects {}, found {}",
            def.path,
            expected,
            input.describe()
        ),
        input.range(),
    )
}

/// Checks `min`/`max` given a comparison of the value against a bound.
/// `compare` returns `None` for bounds of an incompatible kind, which are
/// ignored.
pub(crate) fn check_bounds<F>(
    def: &MemberDef,
    input: &Input<'_>,
    shown: &dyn std::fmt::Display,
    mut compare: F,
) -> Result<()>
where
    F: FnMut(&Value) -> Option<Ordering>,
{
    if let Some(min) = &def.min {
        if compare(min) == Some(Ordering::Less) {
            return Err(Error::validation(
                ErrorCode::OutOfRange,
                format!("{} is less than the minimum {} for '{}'", shown, min, def.path),
                input.range(),
            ));
        }
    }
    if let Some(max) = &def.max {
        if compare(max) == Some(Ordering::Greater) {
            return Err(Error::validation(
                ErrorCode::OutOfRange,
                format!("{} is greater than the maximum {} for '{}'", shown, max, def.path),
                input.range(),
            ));
        }
    }
    Ok(())
}

/// Checks `len`, `minLen` and `maxLen` against a length.
pub(crate) fn check_length(def: &MemberDef, input: &Input<'_>, len: usize) -> Result<()> {
    let violation = match (def.len, def.min_len, def.max_len) {
        (Some(exact), _, _) if len != exact => Some(format!("exactly {}", exact)),
        (_, Some(min), _) if len < min => Some(format!("at least {}", min)),
        (_, _, Some(max)) if len > max => Some(format!("at most {}", max)),
        _ => None,
    };
    match violation {
        Some(expected) => Err(Error::validation(
            ErrorCode::InvalidLength,
            format!(
                "'{}' must have a length of {}, found {}",
                def.path, expected, len
            ),
            input.range(),
        )),
        None => Ok(()),
    }
}
