use super::common::mismatch;
use super::{Input, TypeDef};
use crate::ast::Node;
use crate::processor::{node_to_value, process_map, process_object};
use crate::resolve::ResolutionContext;
use crate::schema::{MemberDef, Schema, SchemaSlot, TypeName};
use crate::ser::write_schema_members;
use crate::{Result, Value};
use std::sync::Arc;

/// Nested objects. With a schema (inline or `$ref`) the object is processed
/// like a top-level one; without, its members are taken as written.
pub struct ObjectDef;

impl ObjectDef {
    fn schema(
        def: &MemberDef,
        input: Option<&Input<'_>>,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Option<Arc<Schema>>> {
        match &def.schema {
            None => Ok(None),
            Some(SchemaSlot::Inline(schema)) => Ok(Some(Arc::clone(schema))),
            Some(SchemaSlot::Ref(name)) => {
                let range = input.and_then(Input::range);
                ctx.resolve_schema(name)
                    .map(Some)
                    .map_err(|e| match range {
                        Some(range) => e.with_range(range),
                        None => e,
                    })
            }
        }
    }
}

impl TypeDef for ObjectDef {
    fn name(&self) -> TypeName {
        TypeName::Object
    }

    fn validate(
        &self,
        input: Input<'_>,
        def: &MemberDef,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Value> {
        if !matches!(
            input,
            Input::Node(Node::Object(_)) | Input::Value(Value::Object(_), _)
        ) {
            return Err(mismatch("an object", &input, def));
        }
        let schema = Self::schema(def, Some(&input), ctx)?;
        match (input, schema) {
            (Input::Node(Node::Object(obj)), Some(schema)) => process_object(obj, &schema, ctx),
            (Input::Value(Value::Object(map), range), Some(schema)) => {
                process_map(map, &schema, range, ctx)
            }
            (Input::Node(node), None) => node_to_value(node, ctx),
            (Input::Value(value, _), None) => Ok(value.clone()),
            _ => Err(mismatch("an object", &input, def)),
        }
    }

    fn stringify(
        &self,
        value: &Value,
        def: &MemberDef,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<String> {
        let (Value::Object(map), Some(schema)) = (value, Self::schema(def, None, ctx)?) else {
            return Ok(value.to_string());
        };
        Ok(format!("{{{}}}", write_schema_members(map, &schema, ctx)?))
    }
}
