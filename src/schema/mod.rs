//! # Schemas and Enums
//!
//! Field definitions and their compiled, lookup-optimized forms.
//!
//! ## Components
//! - **FieldDefinition**: caller-supplied field description (name, tag, type, flags)
//! - **CompiledSchema**: validated fields indexed by tag and by name
//! - **CompiledEnum**: bidirectional name/value lookup
//!
//! Message and enum fields reference other definitions by name only. The
//! reference is resolved when encoding or decoding, which allows schemas to
//! refer to themselves or to each other regardless of definition order.

pub mod compiled;
pub mod field;

pub use compiled::{CompiledEnum, CompiledField, CompiledSchema};
pub use field::{FieldDefinition, FieldLabel, FieldType};
