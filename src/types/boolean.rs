use super::common::mismatch;
use super::{Input, TypeDef};
use crate::resolve::ResolutionContext;
use crate::schema::{MemberDef, TypeName};
use crate::{Result, Value};

pub struct BoolDef;

impl TypeDef for BoolDef {
    fn name(&self) -> TypeName {
        TypeName::Bool
    }

    fn validate(
        &self,
        input: Input<'_>,
        def: &MemberDef,
        _ctx: &mut ResolutionContext<'_>,
    ) -> Result<Value> {
        match input.scalar() {
            Some((Value::Bool(b), _)) => Ok(Value::Bool(*b)),
            _ => Err(mismatch("a boolean", &input, def)),
        }
    }
}
