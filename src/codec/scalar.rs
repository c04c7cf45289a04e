//! Conversions between scalar [`Value`]s and their wire representation.
//!
//! Shared by the encoder, the decoder and default-value validation at
//! definition time. Message and enum fields resolve through the registry and
//! are handled by the callers.

use bytes::BufMut;

use crate::core::value::Value;
use crate::core::wire::{
    put_varint, zigzag_decode32, zigzag_decode64, zigzag_encode32, zigzag_encode64,
};
use crate::schema::FieldType;

/// A scalar ready to be written after its key
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum WireScalar<'a> {
    Varint(u64),
    Fixed32(u32),
    Fixed64(u64),
    Bytes(&'a [u8]),
}

impl WireScalar<'_> {
    pub(crate) fn write<B: BufMut>(self, out: &mut B) {
        match self {
            WireScalar::Varint(v) => put_varint(out, v),
            WireScalar::Fixed32(v) => out.put_u32_le(v),
            WireScalar::Fixed64(v) => out.put_u64_le(v),
            WireScalar::Bytes(data) => {
                put_varint(out, data.len() as u64);
                out.put_slice(data);
            }
        }
    }
}

/// Why a value could not be converted for a field type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarFault {
    TypeMismatch,
    OutOfRange,
}

fn signed(value: &Value) -> Result<i64, ScalarFault> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::UInt(u) => i64::try_from(*u).map_err(|_| ScalarFault::OutOfRange),
        _ => Err(ScalarFault::TypeMismatch),
    }
}

fn unsigned(value: &Value) -> Result<u64, ScalarFault> {
    match value {
        Value::Int(i) => u64::try_from(*i).map_err(|_| ScalarFault::OutOfRange),
        Value::UInt(u) => Ok(*u),
        _ => Err(ScalarFault::TypeMismatch),
    }
}

fn signed32(value: &Value) -> Result<i32, ScalarFault> {
    i32::try_from(signed(value)?).map_err(|_| ScalarFault::OutOfRange)
}

fn unsigned32(value: &Value) -> Result<u32, ScalarFault> {
    u32::try_from(unsigned(value)?).map_err(|_| ScalarFault::OutOfRange)
}

fn float(value: &Value) -> Result<f64, ScalarFault> {
    value.as_f64().ok_or(ScalarFault::TypeMismatch)
}

/// Convert a value to its wire form for a non-message, non-enum field type.
pub(crate) fn to_wire(field_type: FieldType, value: &Value) -> Result<WireScalar<'_>, ScalarFault> {
    let scalar = match field_type {
        FieldType::Double => WireScalar::Fixed64(float(value)?.to_bits()),
        FieldType::Float => {
            let f = float(value)?;
            let narrowed = f as f32;
            if f.is_finite() && narrowed.is_infinite() {
                return Err(ScalarFault::OutOfRange);
            }
            WireScalar::Fixed32(narrowed.to_bits())
        }
        // Plain signed ints are sign-extended into the 64-bit varint space
        FieldType::Int32 => WireScalar::Varint(i64::from(signed32(value)?) as u64),
        FieldType::Int64 => WireScalar::Varint(signed(value)? as u64),
        FieldType::UInt32 => WireScalar::Varint(u64::from(unsigned32(value)?)),
        FieldType::UInt64 => WireScalar::Varint(unsigned(value)?),
        FieldType::SInt32 => WireScalar::Varint(u64::from(zigzag_encode32(signed32(value)?))),
        FieldType::SInt64 => WireScalar::Varint(zigzag_encode64(signed(value)?)),
        FieldType::Fixed32 => WireScalar::Fixed32(unsigned32(value)?),
        FieldType::Fixed64 => WireScalar::Fixed64(unsigned(value)?),
        FieldType::SFixed32 => WireScalar::Fixed32(signed32(value)? as u32),
        FieldType::SFixed64 => WireScalar::Fixed64(signed(value)? as u64),
        FieldType::Bool => match value {
            Value::Bool(b) => WireScalar::Varint(u64::from(*b)),
            _ => return Err(ScalarFault::TypeMismatch),
        },
        FieldType::String => match value {
            Value::String(s) => WireScalar::Bytes(s.as_bytes()),
            _ => return Err(ScalarFault::TypeMismatch),
        },
        FieldType::Bytes => match value {
            Value::Bytes(b) => WireScalar::Bytes(b),
            Value::String(s) => WireScalar::Bytes(s.as_bytes()),
            _ => return Err(ScalarFault::TypeMismatch),
        },
        FieldType::Message | FieldType::Enum => return Err(ScalarFault::TypeMismatch),
    };
    Ok(scalar)
}

/// Convert a declared default into the value the decoder would produce for
/// the same input on the wire, or `None` when it does not fit the field type.
///
/// Enum defaults may name a value or give its number; membership is checked
/// at decode time because the enum may not be defined yet.
pub(crate) fn normalize_default(field_type: FieldType, value: &Value) -> Option<Value> {
    match field_type {
        FieldType::Message => None,
        FieldType::Enum => match value {
            Value::String(_) => Some(value.clone()),
            other => signed32(other).ok().map(|n| Value::Int(i64::from(n))),
        },
        other => match to_wire(other, value).ok()? {
            WireScalar::Varint(raw) => from_varint(other, raw),
            WireScalar::Fixed32(raw) => from_fixed32(other, raw),
            WireScalar::Fixed64(raw) => from_fixed64(other, raw),
            WireScalar::Bytes(data) if other == FieldType::Bytes => {
                Some(Value::Bytes(data.to_vec()))
            }
            WireScalar::Bytes(_) => Some(value.clone()),
        },
    }
}

/// Interpret a raw varint according to the field type.
pub(crate) fn from_varint(field_type: FieldType, raw: u64) -> Option<Value> {
    let value = match field_type {
        FieldType::Int32 => Value::Int(i64::from(raw as i32)),
        FieldType::Int64 => Value::Int(raw as i64),
        FieldType::UInt32 => Value::Int(i64::from(raw as u32)),
        FieldType::UInt64 => Value::from_unsigned(raw),
        FieldType::SInt32 => Value::Int(i64::from(zigzag_decode32(raw as u32))),
        FieldType::SInt64 => Value::Int(zigzag_decode64(raw)),
        FieldType::Bool => Value::Bool(raw != 0),
        _ => return None,
    };
    Some(value)
}

/// Interpret a raw little-endian 32-bit value according to the field type.
pub(crate) fn from_fixed32(field_type: FieldType, raw: u32) -> Option<Value> {
    let value = match field_type {
        FieldType::Float => Value::Float(f64::from(f32::from_bits(raw))),
        FieldType::Fixed32 => Value::Int(i64::from(raw)),
        FieldType::SFixed32 => Value::Int(i64::from(raw as i32)),
        _ => return None,
    };
    Some(value)
}

/// Interpret a raw little-endian 64-bit value according to the field type.
pub(crate) fn from_fixed64(field_type: FieldType, raw: u64) -> Option<Value> {
    let value = match field_type {
        FieldType::Double => Value::Float(f64::from_bits(raw)),
        FieldType::Fixed64 => Value::from_unsigned(raw),
        FieldType::SFixed64 => Value::Int(raw as i64),
        _ => return None,
    };
    Some(value)
}
