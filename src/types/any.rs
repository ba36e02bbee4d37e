use super::{Input, TypeDef};
use crate::processor::node_to_value;
use crate::resolve::ResolutionContext;
use crate::schema::{MemberDef, TypeName};
use crate::{Result, Value};

/// Accepts any value as written.
pub struct AnyDef;

impl TypeDef for AnyDef {
    fn name(&self) -> TypeName {
        TypeName::Any
    }

    fn validate(
        &self,
        input: Input<'_>,
        _def: &MemberDef,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Value> {
        match input {
            Input::Node(node) => node_to_value(node, ctx),
            Input::Value(value, _) => Ok(value.clone()),
        }
    }
}
