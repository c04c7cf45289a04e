//! Schema-driven encoder.
//!
//! Walks a [`Value::Map`] against a compiled schema in field definition
//! order and writes keyed values. Output is written into a caller-owned
//! buffer that the caller discards on error.

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::codec::scalar::{to_wire, ScalarFault};
use crate::core::value::Value;
use crate::core::wire::{put_key, put_varint, WireType};
use crate::error::{IibinError, Result};
use crate::registry::RegistrySnapshot;
use crate::schema::{CompiledField, CompiledSchema, FieldType};

pub(crate) struct Encoder<'r> {
    registry: &'r RegistrySnapshot,
    max_depth: usize,
}

impl<'r> Encoder<'r> {
    pub(crate) fn new(registry: &'r RegistrySnapshot, max_depth: usize) -> Self {
        Self {
            registry,
            max_depth,
        }
    }

    /// Encode `value` as a top-level message of `schema_name` into `out`.
    pub(crate) fn encode(&self, schema_name: &str, value: &Value, out: &mut BytesMut) -> Result<()> {
        let schema = self.registry.schema(schema_name)?;
        self.encode_message(schema, value, out, 0)
    }

    fn encode_message(
        &self,
        schema: &CompiledSchema,
        value: &Value,
        out: &mut BytesMut,
        depth: usize,
    ) -> Result<()> {
        let map = value.as_map().ok_or_else(|| IibinError::TypeMismatch {
            field: schema.name().to_string(),
            expected: "map".to_string(),
        })?;

        for field in schema.fields() {
            let present = match map.get(&*field.name) {
                None | Some(Value::Null) => None,
                Some(v) => Some(v),
            };

            let Some(value) = present else {
                if field.is_required() {
                    return Err(IibinError::MissingRequiredField {
                        schema: schema.name().to_string(),
                        field: field.name.to_string(),
                    });
                }
                continue;
            };

            if field.is_repeated() {
                self.encode_repeated(field, value, out, depth)?;
            } else {
                self.encode_single(field, value, out, depth)?;
            }
        }

        Ok(())
    }

    fn encode_repeated(
        &self,
        field: &CompiledField,
        value: &Value,
        out: &mut BytesMut,
        depth: usize,
    ) -> Result<()> {
        let items = value.as_list().ok_or_else(|| IibinError::TypeMismatch {
            field: field.name.to_string(),
            expected: "list".to_string(),
        })?;

        if items.is_empty() {
            return Ok(());
        }

        if field.packed {
            let mut payload = BytesMut::new();
            for item in items {
                self.write_raw(field, item, &mut payload)?;
            }
            trace!(field = %field.name, count = items.len(), "Packed repeated field");
            put_key(out, field.tag, WireType::LengthDelimited);
            put_varint(out, payload.len() as u64);
            out.put_slice(&payload);
        } else {
            for item in items {
                self.encode_single(field, item, out, depth)?;
            }
        }

        Ok(())
    }

    /// Write one complete key + value pair.
    fn encode_single(
        &self,
        field: &CompiledField,
        value: &Value,
        out: &mut BytesMut,
        depth: usize,
    ) -> Result<()> {
        if field.field_type == FieldType::Message {
            let next = depth + 1;
            if next > self.max_depth {
                return Err(IibinError::RecursionLimitExceeded(self.max_depth));
            }
            let nested = self.registry.schema(field.nested_type())?;
            if value.as_map().is_none() {
                return Err(IibinError::TypeMismatch {
                    field: field.name.to_string(),
                    expected: format!("map ({})", nested.name()),
                });
            }

            let mut payload = BytesMut::new();
            self.encode_message(nested, value, &mut payload, next)?;
            put_key(out, field.tag, WireType::LengthDelimited);
            put_varint(out, payload.len() as u64);
            out.put_slice(&payload);
            return Ok(());
        }

        put_key(out, field.tag, field.field_type.wire_type());
        self.write_raw(field, value, out)
    }

    /// Write a value without its key (scalars and enums).
    fn write_raw(&self, field: &CompiledField, value: &Value, out: &mut BytesMut) -> Result<()> {
        if field.field_type == FieldType::Enum {
            let number = self.enum_number(field, value)?;
            put_varint(out, i64::from(number) as u64);
            return Ok(());
        }

        let scalar = to_wire(field.field_type, value).map_err(|fault| match fault {
            ScalarFault::TypeMismatch => IibinError::TypeMismatch {
                field: field.name.to_string(),
                expected: field.field_type.to_string(),
            },
            ScalarFault::OutOfRange => IibinError::ValueOutOfRange {
                field: field.name.to_string(),
                field_type: field.field_type.to_string(),
            },
        })?;
        scalar.write(out);
        Ok(())
    }

    /// Resolve an enum value given by name or by number.
    fn enum_number(&self, field: &CompiledField, value: &Value) -> Result<i32> {
        let def = self.registry.enum_def(field.nested_type())?;
        let unknown = |shown: String| IibinError::UnknownEnumValue {
            enum_name: def.name().to_string(),
            value: shown,
        };

        match value {
            Value::String(name) => def.value_of(name).ok_or_else(|| unknown(name.clone())),
            Value::Int(_) | Value::UInt(_) => {
                let number = value
                    .as_i64()
                    .and_then(|n| i32::try_from(n).ok())
                    .ok_or_else(|| unknown(format!("{value:?}")))?;
                match def.name_of(number) {
                    Some(_) => Ok(number),
                    None => Err(unknown(number.to_string())),
                }
            }
            other => Err(IibinError::TypeMismatch {
                field: field.name.to_string(),
                expected: format!("enum {} (name or number), got {}", def.name(), other.kind()),
            }),
        }
    }
}
