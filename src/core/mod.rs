//! # Core Codec Components
//!
//! Low-level wire primitives and the structured value model.
//!
//! ## Components
//! - **Wire**: varint, zigzag, fixed-width integers, keys and a bounds-checked reader
//! - **Value**: the tagged value crossing the encode/decode boundary
//!
//! ## Wire Format
//! ```text
//! [Key(varint)] [Value(varint | fixed32 | fixed64 | len + bytes)] ...
//! ```
//!
//! ## Security
//! - Varints capped at 10 bytes
//! - Length validation before slicing

pub mod value;
pub mod wire;
