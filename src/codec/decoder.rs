//! Schema-driven decoder.
//!
//! Scans keyed values, decoding known tags per their declared type and
//! skipping unknown ones. Values are collected per tag and assembled in
//! field definition order once the input is exhausted, so nothing partial
//! escapes on error.

use std::collections::HashMap;

use tracing::trace;

use crate::codec::scalar::{from_fixed32, from_fixed64, from_varint};
use crate::core::value::{Value, ValueMap};
use crate::core::wire::{WireReader, WireType};
use crate::error::{IibinError, Result};
use crate::registry::RegistrySnapshot;
use crate::schema::{CompiledField, CompiledSchema, FieldType};

pub(crate) struct Decoder<'r> {
    registry: &'r RegistrySnapshot,
    max_depth: usize,
    unknown_fields: u64,
}

impl<'r> Decoder<'r> {
    pub(crate) fn new(registry: &'r RegistrySnapshot, max_depth: usize) -> Self {
        Self {
            registry,
            max_depth,
            unknown_fields: 0,
        }
    }

    /// Unknown fields skipped so far, across all nesting levels
    pub(crate) fn unknown_fields(&self) -> u64 {
        self.unknown_fields
    }

    pub(crate) fn decode(&mut self, schema_name: &str, buf: &[u8], as_object: bool) -> Result<Value> {
        let schema = self.registry.schema(schema_name)?;
        self.decode_message(schema, buf, as_object, 0)
            .map(Value::Map)
    }

    fn decode_message(
        &mut self,
        schema: &CompiledSchema,
        buf: &[u8],
        as_object: bool,
        depth: usize,
    ) -> Result<ValueMap> {
        let mut reader = WireReader::new(buf);
        let mut singles: HashMap<u32, Value> = HashMap::new();
        let mut repeated: HashMap<u32, Vec<Value>> = HashMap::new();

        while !reader.is_empty() {
            let (tag, wire_type) = reader.read_key()?;

            let Some(field) = schema.field_by_tag(tag) else {
                trace!(schema = schema.name(), tag, "Skipping unknown field");
                reader.skip(wire_type)?;
                self.unknown_fields += 1;
                continue;
            };

            if field.is_repeated() {
                let items = repeated.entry(tag).or_default();
                if wire_type == WireType::LengthDelimited && field.field_type.is_packable() {
                    let payload = reader.read_length_delimited()?;
                    let mut packed = WireReader::new(payload);
                    while !packed.is_empty() {
                        items.push(self.read_element(field, &mut packed)?);
                    }
                } else {
                    check_wire_type(field, wire_type)?;
                    items.push(self.read_value(field, &mut reader, as_object, depth)?);
                }
            } else {
                check_wire_type(field, wire_type)?;
                // Last occurrence wins
                let value = self.read_value(field, &mut reader, as_object, depth)?;
                singles.insert(tag, value);
            }
        }

        let mut out = ValueMap::new();
        for field in schema.fields() {
            let name = field.name.to_string();
            if field.is_repeated() {
                match repeated.remove(&field.tag) {
                    Some(items) => {
                        out.insert(name, Value::List(items));
                    }
                    None if as_object => {
                        out.insert(name, Value::List(Vec::new()));
                    }
                    None => {}
                }
                continue;
            }

            match singles.remove(&field.tag) {
                Some(value) => {
                    out.insert(name, value);
                }
                None if field.is_required() => {
                    return Err(IibinError::MissingRequiredField {
                        schema: schema.name().to_string(),
                        field: name,
                    });
                }
                None => {
                    if let Some(default) = self.default_for(field)? {
                        out.insert(name, default);
                    } else if as_object {
                        out.insert(name, Value::Null);
                    }
                }
            }
        }

        Ok(out)
    }

    /// Read a complete value for `field` whose key has already been consumed.
    fn read_value(
        &mut self,
        field: &CompiledField,
        reader: &mut WireReader<'_>,
        as_object: bool,
        depth: usize,
    ) -> Result<Value> {
        match field.field_type {
            FieldType::Message => {
                let payload = reader.read_length_delimited()?;
                let next = depth + 1;
                if next > self.max_depth {
                    return Err(IibinError::RecursionLimitExceeded(self.max_depth));
                }
                let nested = self.registry.schema(field.nested_type())?;
                self.decode_message(nested, payload, as_object, next)
                    .map(Value::Map)
            }
            FieldType::String => {
                let data = reader.read_length_delimited()?;
                String::from_utf8(data.to_vec())
                    .map(Value::String)
                    .map_err(|_| IibinError::InvalidUtf8(field.name.to_string()))
            }
            FieldType::Bytes => Ok(Value::Bytes(reader.read_length_delimited()?.to_vec())),
            _ => self.read_element(field, reader),
        }
    }

    /// Read one numeric/bool/enum element (no key), as found in packed payloads.
    fn read_element(&self, field: &CompiledField, reader: &mut WireReader<'_>) -> Result<Value> {
        let field_type = field.field_type;
        let decoded = match field_type.wire_type() {
            WireType::Varint => {
                let raw = reader.read_varint()?;
                if field_type == FieldType::Enum {
                    // Enum numbers are int32, written sign-extended to 64 bits
                    let number = i32::try_from(raw as i64).map_err(|_| {
                        IibinError::UnknownEnumValue {
                            enum_name: field.nested_type().to_string(),
                            value: raw.to_string(),
                        }
                    })?;
                    return self.enum_name(field, number);
                }
                from_varint(field_type, raw)
            }
            WireType::Fixed32 => from_fixed32(field_type, reader.read_fixed32()?),
            WireType::Fixed64 => from_fixed64(field_type, reader.read_fixed64()?),
            WireType::LengthDelimited => None,
        };

        decoded.ok_or_else(|| IibinError::WireTypeMismatch {
            field: field.name.to_string(),
            expected: field_type.wire_type().as_u8(),
            found: WireType::LengthDelimited.as_u8(),
        })
    }

    fn enum_name(&self, field: &CompiledField, number: i32) -> Result<Value> {
        let def = self.registry.enum_def(field.nested_type())?;
        def.name_of(number)
            .map(|name| Value::String(name.to_string()))
            .ok_or_else(|| IibinError::UnknownEnumValue {
                enum_name: def.name().to_string(),
                value: number.to_string(),
            })
    }

    /// Declared default for an absent field; enum numbers resolve to names.
    fn default_for(&self, field: &CompiledField) -> Result<Option<Value>> {
        match (&field.default_value, field.field_type) {
            (None, _) => Ok(None),
            (Some(Value::String(name)), FieldType::Enum) => {
                let def = self.registry.enum_def(field.nested_type())?;
                match def.value_of(name) {
                    Some(_) => Ok(Some(Value::String(name.clone()))),
                    None => Err(IibinError::UnknownEnumValue {
                        enum_name: def.name().to_string(),
                        value: name.clone(),
                    }),
                }
            }
            (Some(value), FieldType::Enum) => {
                match value.as_i64().and_then(|n| i32::try_from(n).ok()) {
                    Some(number) => self.enum_name(field, number).map(Some),
                    None => Ok(Some(value.clone())),
                }
            }
            (Some(value), _) => Ok(Some(value.clone())),
        }
    }
}

fn check_wire_type(field: &CompiledField, found: WireType) -> Result<()> {
    let expected = field.field_type.wire_type();
    if found == expected {
        Ok(())
    } else {
        Err(IibinError::WireTypeMismatch {
            field: field.name.to_string(),
            expected: expected.as_u8(),
            found: found.as_u8(),
        })
    }
}
