use super::common::{check_length, mismatch};
use super::{Input, TypeDef};
use crate::resolve::ResolutionContext;
use crate::schema::{MemberDef, TypeName};
use crate::tokenizer::decode_base64;
use crate::{Result, Value};

/// Binary data, written `b'...'` or as a base64 string. Length constraints
/// count decoded bytes.
pub struct Base64Def;

impl TypeDef for Base64Def {
    fn name(&self) -> TypeName {
        TypeName::Base64
    }

    fn validate(
        &self,
        input: Input<'_>,
        def: &MemberDef,
        _ctx: &mut ResolutionContext<'_>,
    ) -> Result<Value> {
        let bytes = match input.scalar() {
            Some((Value::Binary(bytes), _)) => bytes.clone(),
            Some((Value::String(s), _)) => {
                decode_base64(s).ok_or_else(|| mismatch("base64 data", &input, def))?
            }
            _ => return Err(mismatch("base64 data", &input, def)),
        };
        check_length(def, &input, bytes.len())?;
        Ok(Value::Binary(bytes))
    }
}
