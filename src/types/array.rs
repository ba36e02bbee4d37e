use super::common::{check_length, mismatch};
use super::{check_member, parse_member, stringify_member, Input, TypeDef};
use crate::ast::Node;
use crate::resolve::ResolutionContext;
use crate::schema::{MemberDef, TypeName};
use crate::{Result, Value};

/// Arrays, optionally typed by `of`. Elements are validated in order and the
/// first failing element stops validation.
pub struct ArrayDef;

impl TypeDef for ArrayDef {
    fn name(&self) -> TypeName {
        TypeName::Array
    }

    fn validate(
        &self,
        input: Input<'_>,
        def: &MemberDef,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Value> {
        let element = def.element();
        let items = match input {
            Input::Node(Node::Array(arr)) => {
                check_length(def, &input, arr.elements.len())?;
                let mut items = Vec::with_capacity(arr.elements.len());
                for node in &arr.elements {
                    items.push(parse_member(Some(node), &element, ctx)?.unwrap_or(Value::Null));
                }
                items
            }
            Input::Value(Value::Array(values), range) => {
                check_length(def, &input, values.len())?;
                let mut items = Vec::with_capacity(values.len());
                for value in values {
                    items.push(check_member(Some(value), range, &element, ctx)?.unwrap_or(Value::Null));
                }
                items
            }
            _ => return Err(mismatch("an array", &input, def)),
        };
        Ok(Value::Array(items))
    }

    fn stringify(
        &self,
        value: &Value,
        def: &MemberDef,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<String> {
        let Value::Array(items) = value else {
            return Ok(value.to_string());
        };
        let element = def.element();
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            parts.push(stringify_member(item, &element, ctx)?);
        }
        Ok(format!("[{}]", parts.join(", ")))
    }
}
