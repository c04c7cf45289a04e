//! # IIBIN
//!
//! Schema-driven binary serialization with a protobuf-compatible wire format.
//!
//! Callers register named schemas (ordered, tagged field definitions) and
//! named enums with a [`Registry`], then encode structured [`Value`] maps to
//! bytes and decode bytes back to maps.
//!
//! ## Modules
//! - [`core`]: wire primitives (varint, zigzag, fixed-width, keys) and the value model
//! - [`schema`]: field definitions and their compiled forms
//! - [`registry`]: definition storage plus encode/decode entry points
//! - [`config`]: limits, buffer arena and logging settings (TOML and env)
//! - [`utils`]: buffer arena, string interning, logging and metrics
//! - [`error`]: the crate-wide error type
//!
//! ## Example
//! ```rust
//! use iibin::{FieldDefinition, FieldType, Registry, Value};
//!
//! let registry = Registry::default();
//! registry.define_schema(
//!     "Point",
//!     vec![
//!         FieldDefinition::new("x", 1, FieldType::SInt32),
//!         FieldDefinition::new("y", 2, FieldType::SInt32),
//!     ],
//! )?;
//!
//! let point = Value::map([("x", -3), ("y", 7)]);
//! let bytes = registry.encode("Point", &point)?;
//! assert_eq!(&bytes[..], &[0x08, 0x05, 0x10, 0x0E]);
//! assert_eq!(registry.decode("Point", &bytes, false)?, point);
//! # Ok::<(), iibin::IibinError>(())
//! ```

#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod config;
pub mod core;
pub mod error;
pub mod registry;
pub mod schema;
pub mod utils;

mod codec;

pub use crate::config::IibinConfig;
pub use crate::core::value::{Value, ValueMap};
pub use crate::error::{IibinError, Result};
pub use crate::registry::Registry;
pub use crate::schema::{CompiledEnum, CompiledSchema, FieldDefinition, FieldLabel, FieldType};
