//! Field definitions as supplied by callers, before compilation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::value::Value;
use crate::core::wire::WireType;
use crate::error::IibinError;

/// Closed set of field types understood by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    Double,
    Float,
    Int32,
    Int64,
    UInt32,
    UInt64,
    SInt32,
    SInt64,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Bool,
    String,
    Bytes,
    Message,
    Enum,
}

impl FieldType {
    /// Every supported type, in declaration order
    pub const ALL: [FieldType; 17] = [
        FieldType::Double,
        FieldType::Float,
        FieldType::Int32,
        FieldType::Int64,
        FieldType::UInt32,
        FieldType::UInt64,
        FieldType::SInt32,
        FieldType::SInt64,
        FieldType::Fixed32,
        FieldType::Fixed64,
        FieldType::SFixed32,
        FieldType::SFixed64,
        FieldType::Bool,
        FieldType::String,
        FieldType::Bytes,
        FieldType::Message,
        FieldType::Enum,
    ];

    /// Lowercase type token used in schema descriptors
    pub fn token(self) -> &'static str {
        match self {
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::UInt32 => "uint32",
            FieldType::UInt64 => "uint64",
            FieldType::SInt32 => "sint32",
            FieldType::SInt64 => "sint64",
            FieldType::Fixed32 => "fixed32",
            FieldType::Fixed64 => "fixed64",
            FieldType::SFixed32 => "sfixed32",
            FieldType::SFixed64 => "sfixed64",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Message => "message",
            FieldType::Enum => "enum",
        }
    }

    /// Wire type used for a single (unpacked) value of this type
    pub fn wire_type(self) -> WireType {
        match self {
            FieldType::Double | FieldType::Fixed64 | FieldType::SFixed64 => WireType::Fixed64,
            FieldType::Float | FieldType::Fixed32 | FieldType::SFixed32 => WireType::Fixed32,
            FieldType::String | FieldType::Bytes | FieldType::Message => WireType::LengthDelimited,
            FieldType::Int32
            | FieldType::Int64
            | FieldType::UInt32
            | FieldType::UInt64
            | FieldType::SInt32
            | FieldType::SInt64
            | FieldType::Bool
            | FieldType::Enum => WireType::Varint,
        }
    }

    /// Scalar numeric types (including bool and enum) may use packed encoding
    pub fn is_packable(self) -> bool {
        self.wire_type() != WireType::LengthDelimited
    }

    /// Message and enum fields reference another registry entry by name
    pub fn needs_nested_type(self) -> bool {
        matches!(self, FieldType::Message | FieldType::Enum)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for FieldType {
    type Err = IibinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.token() == token)
            .ok_or_else(|| IibinError::InvalidFieldDefinition {
                schema: String::new(),
                field: String::new(),
                reason: format!("unknown field type: {s}"),
            })
    }
}

impl TryFrom<String> for FieldType {
    type Error = IibinError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.token().to_string()
    }
}

/// Cardinality of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldLabel {
    #[default]
    Optional,
    Required,
    Repeated,
}

/// A single field of a schema, as supplied to `Registry::define_schema`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name, unique within the schema
    pub name: String,

    /// Stable wire identifier, unique within the schema
    pub tag: u32,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub label: FieldLabel,

    /// Packed encoding, repeated scalar numeric fields only
    #[serde(default)]
    pub packed: bool,

    /// Schema or enum name for message/enum fields
    #[serde(default, rename = "nested_type", skip_serializing_if = "Option::is_none")]
    pub nested_type_name: Option<String>,

    /// Value used at decode time when the field is absent
    #[serde(default, rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    /// Advisory only
    #[serde(default)]
    pub deprecated: bool,
}

impl FieldDefinition {
    /// Create an optional field of the given type
    pub fn new(name: impl Into<String>, tag: u32, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            tag,
            field_type,
            label: FieldLabel::Optional,
            packed: false,
            nested_type_name: None,
            default_value: None,
            deprecated: false,
        }
    }

    /// Create a message-typed field referencing `schema`
    pub fn message(name: impl Into<String>, tag: u32, schema: impl Into<String>) -> Self {
        Self::new(name, tag, FieldType::Message).nested(schema)
    }

    /// Create an enum-typed field referencing `enum_name`
    pub fn enumeration(name: impl Into<String>, tag: u32, enum_name: impl Into<String>) -> Self {
        Self::new(name, tag, FieldType::Enum).nested(enum_name)
    }

    pub fn required(mut self) -> Self {
        self.label = FieldLabel::Required;
        self
    }

    pub fn repeated(mut self) -> Self {
        self.label = FieldLabel::Repeated;
        self
    }

    /// Mark as repeated and packed
    pub fn packed(mut self) -> Self {
        self.label = FieldLabel::Repeated;
        self.packed = true;
        self
    }

    pub fn nested(mut self, type_name: impl Into<String>) -> Self {
        self.nested_type_name = Some(type_name.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}
