//! # Error Types
//!
//! Error handling for schema definition, encoding and decoding.
//!
//! This module defines every error variant the engine can produce, from
//! low-level wire violations to schema definition problems.
//!
//! ## Error Categories
//! - **Definition Errors**: duplicate names, invalid fields, field limits
//! - **Lookup Errors**: unknown schemas or enums referenced by name
//! - **Encode Errors**: missing required fields, type mismatches, range checks
//! - **Wire Errors**: truncated buffers, malformed varints, invalid keys
//! - **Resource Errors**: recursion limit, buffer arena exhaustion
//!
//! Unknown fields found while decoding are *not* errors; they are skipped.
//!
//! ## Example Usage
//! ```rust
//! use iibin::error::{IibinError, Result};
//! use iibin::Registry;
//! use tracing::{error, info};
//!
//! fn lookup(registry: &Registry, name: &str) -> Result<()> {
//!     if registry.is_schema_defined(name) {
//!         Ok(())
//!     } else {
//!         Err(IibinError::SchemaNotFound(name.to_string()))
//!     }
//! }
//!
//! let registry = Registry::default();
//! match lookup(&registry, "User") {
//!     Ok(()) => info!("schema found"),
//!     Err(e) => error!(error = %e, "lookup failed"),
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Registry lock errors
    pub const ERR_REGISTRY_WRITE_LOCK: &str = "Failed to acquire write lock on registry";
    pub const ERR_REGISTRY_READ_LOCK: &str = "Failed to acquire read lock on registry";

    /// Definition errors
    pub const ERR_EMPTY_NAME: &str = "name cannot be empty";
    pub const ERR_ZERO_TAG: &str = "tag must be a positive integer";
    pub const ERR_TAG_TOO_LARGE: &str = "tag exceeds the maximum field number (536870911)";
    pub const ERR_DUPLICATE_TAG: &str = "tag already used in this schema";
    pub const ERR_DUPLICATE_NAME: &str = "field name already used in this schema";
    pub const ERR_MISSING_NESTED_TYPE: &str = "message and enum fields require a nested type name";
    pub const ERR_UNEXPECTED_NESTED_TYPE: &str =
        "nested type name is only valid for message and enum fields";
    pub const ERR_PACKED_NOT_REPEATED: &str = "packed is only valid on repeated fields";
    pub const ERR_PACKED_NOT_NUMERIC: &str = "packed is only valid on scalar numeric types";
    pub const ERR_DEFAULT_ON_REPEATED: &str = "repeated fields cannot carry a default value";
    pub const ERR_DEFAULT_ON_MESSAGE: &str = "message fields cannot carry a default value";
    pub const ERR_DEFAULT_TYPE: &str = "default value does not match the field type";

    /// Enum definition errors
    pub const ERR_EMPTY_ENUM: &str = "enum must define at least one value";
    pub const ERR_DUPLICATE_ENUM_NAME: &str = "enum value name already defined";

    /// Resource errors
    pub const ERR_ARENA_EXHAUSTED: &str = "Buffer arena exhausted";
    pub const ERR_LOCK_POISONED: &str = "Synchronization primitive poisoned";
}

/// Kind of registry entry named in a [`IibinError::DuplicateDefinition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefinitionKind {
    Schema,
    Enum,
}

impl std::fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefinitionKind::Schema => f.write_str("schema"),
            DefinitionKind::Enum => f.write_str("enum"),
        }
    }
}

// IibinError is the primary error type for every registry and codec operation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IibinError {
    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("Enum not found: {0}")]
    EnumNotFound(String),

    #[error("Duplicate {kind} definition: {name}")]
    DuplicateDefinition { kind: DefinitionKind, name: String },

    #[error("Invalid field definition {schema}.{field}: {reason}")]
    InvalidFieldDefinition {
        schema: String,
        field: String,
        reason: String,
    },

    #[error("Invalid enum definition {name}: {reason}")]
    InvalidEnumDefinition { name: String, reason: String },

    #[error("Schema {schema} has {count} fields (limit: {limit})")]
    SchemaFieldLimitExceeded {
        schema: String,
        count: usize,
        limit: usize,
    },

    #[error("Missing required field {schema}.{field}")]
    MissingRequiredField { schema: String, field: String },

    #[error("Recursion limit exceeded (max depth: {0})")]
    RecursionLimitExceeded(usize),

    #[error("Malformed varint")]
    MalformedVarint,

    #[error("Truncated buffer: need {needed} bytes, have {available}")]
    TruncatedBuffer { needed: usize, available: usize },

    #[error("Unknown value {value} for enum {enum_name}")]
    UnknownEnumValue { enum_name: String, value: String },

    #[error("Type mismatch for field {field}: expected {expected}")]
    TypeMismatch { field: String, expected: String },

    #[error("Value out of range for field {field} ({field_type})")]
    ValueOutOfRange { field: String, field_type: String },

    #[error("Wire type mismatch for field {field}: expected {expected}, found {found}")]
    WireTypeMismatch {
        field: String,
        expected: u8,
        found: u8,
    },

    #[error("Invalid field key: {0:#x}")]
    InvalidKey(u64),

    #[error("Invalid UTF-8 in string field {0}")]
    InvalidUtf8(String),

    #[error("Buffer arena exhausted ({0} buffers in use)")]
    BufferArenaExhausted(usize),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl IibinError {
    /// Convenience constructor for field definition failures.
    pub(crate) fn invalid_field(schema: &str, field: &str, reason: &str) -> Self {
        IibinError::InvalidFieldDefinition {
            schema: schema.to_string(),
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for errors raised while parsing bytes off the wire.
    pub fn is_wire_error(&self) -> bool {
        matches!(
            self,
            IibinError::MalformedVarint
                | IibinError::TruncatedBuffer { .. }
                | IibinError::InvalidKey(_)
                | IibinError::WireTypeMismatch { .. }
                | IibinError::InvalidUtf8(_)
        )
    }
}

/// Type alias for Results using IibinError
pub type Result<T> = std::result::Result<T, IibinError>;
