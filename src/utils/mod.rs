//! # Utility Modules
//!
//! Supporting utilities for buffers, interning, logging and metrics.
//!
//! ## Components
//! - **Buffer Pool**: bounded arena of encode buffers with RAII release
//! - **Interner**: shared `Arc<str>` storage for schema names
//! - **Logging**: structured logging configuration
//! - **Metrics**: thread-safe observability counters

pub mod buffer_pool;
pub mod interner;
pub mod logging;
pub mod metrics;

pub use buffer_pool::{ArenaBuffer, BufferArena};
pub use metrics::{Metrics, MetricsSnapshot};
