//! # Schema-Driven Codec
//!
//! Encoder and decoder that walk a [`Value`](crate::Value) against a compiled
//! schema. Both resolve nested message and enum names through the registry
//! snapshot at the moment they are needed.
//!
//! ## Safety Bounds
//! - Nesting deeper than `max_recursion_depth` fails with `RecursionLimitExceeded`
//! - Truncated input and malformed varints abort the whole operation
//! - Unknown tags are skipped, never rejected

mod decoder;
mod encoder;
pub(crate) mod scalar;

pub(crate) use decoder::Decoder;
pub(crate) use encoder::Encoder;
