//! Observability and Metrics
//!
//! Counters for definitions, encodes and decodes. Each [`Registry`](crate::Registry)
//! owns its own [`Metrics`], so independent registries report independently.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Metrics collector for registry and codec operations
#[derive(Debug)]
pub struct Metrics {
    /// Schemas successfully registered
    pub schemas_defined: AtomicU64,
    /// Enums successfully registered
    pub enums_defined: AtomicU64,
    /// Definitions rejected by validation
    pub definitions_rejected: AtomicU64,
    /// Total encode calls
    pub encodes_total: AtomicU64,
    /// Encode calls that failed
    pub encode_errors: AtomicU64,
    /// Total decode calls
    pub decodes_total: AtomicU64,
    /// Decode calls that failed
    pub decode_errors: AtomicU64,
    /// Bytes produced by successful encodes
    pub bytes_encoded: AtomicU64,
    /// Bytes consumed by successful decodes
    pub bytes_decoded: AtomicU64,
    /// Unknown fields skipped while decoding
    pub unknown_fields_skipped: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            schemas_defined: AtomicU64::new(0),
            enums_defined: AtomicU64::new(0),
            definitions_rejected: AtomicU64::new(0),
            encodes_total: AtomicU64::new(0),
            encode_errors: AtomicU64::new(0),
            decodes_total: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            bytes_encoded: AtomicU64::new(0),
            bytes_decoded: AtomicU64::new(0),
            unknown_fields_skipped: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record committed definitions
    pub fn definitions_committed(&self, schemas: u64, enums: u64) {
        self.schemas_defined.fetch_add(schemas, Ordering::Relaxed);
        self.enums_defined.fetch_add(enums, Ordering::Relaxed);
    }

    /// Record a rejected definition
    pub fn definition_rejected(&self) {
        self.definitions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an encode result
    pub fn encode_finished(&self, bytes: Option<usize>) {
        self.encodes_total.fetch_add(1, Ordering::Relaxed);
        match bytes {
            Some(n) => {
                self.bytes_encoded.fetch_add(n as u64, Ordering::Relaxed);
            }
            None => {
                self.encode_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record a decode result; unknown fields only count for accepted input
    pub fn decode_finished(&self, bytes: Option<usize>, unknown_fields: u64) {
        self.decodes_total.fetch_add(1, Ordering::Relaxed);
        match bytes {
            Some(n) => {
                self.bytes_decoded.fetch_add(n as u64, Ordering::Relaxed);
                self.unknown_fields_skipped
                    .fetch_add(unknown_fields, Ordering::Relaxed);
            }
            None => {
                self.decode_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            schemas_defined: self.schemas_defined.load(Ordering::Relaxed),
            enums_defined: self.enums_defined.load(Ordering::Relaxed),
            definitions_rejected: self.definitions_rejected.load(Ordering::Relaxed),
            encodes_total: self.encodes_total.load(Ordering::Relaxed),
            encode_errors: self.encode_errors.load(Ordering::Relaxed),
            decodes_total: self.decodes_total.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            bytes_decoded: self.bytes_decoded.load(Ordering::Relaxed),
            unknown_fields_skipped: self.unknown_fields_skipped.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            schemas_defined = snapshot.schemas_defined,
            enums_defined = snapshot.enums_defined,
            definitions_rejected = snapshot.definitions_rejected,
            encodes_total = snapshot.encodes_total,
            encode_errors = snapshot.encode_errors,
            decodes_total = snapshot.decodes_total,
            decode_errors = snapshot.decode_errors,
            bytes_encoded = snapshot.bytes_encoded,
            bytes_decoded = snapshot.bytes_decoded,
            unknown_fields_skipped = snapshot.unknown_fields_skipped,
            uptime_seconds = snapshot.uptime_seconds,
            "Codec metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub schemas_defined: u64,
    pub enums_defined: u64,
    pub definitions_rejected: u64,
    pub encodes_total: u64,
    pub encode_errors: u64,
    pub decodes_total: u64,
    pub decode_errors: u64,
    pub bytes_encoded: u64,
    pub bytes_decoded: u64,
    pub unknown_fields_skipped: u64,
    pub uptime_seconds: u64,
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = Metrics::new();
        metrics.definitions_committed(2, 1);
        metrics.definition_rejected();
        metrics.encode_finished(Some(10));
        metrics.encode_finished(None);
        metrics.decode_finished(Some(10), 3);

        let snap = metrics.snapshot();
        assert_eq!(snap.schemas_defined, 2);
        assert_eq!(snap.enums_defined, 1);
        assert_eq!(snap.definitions_rejected, 1);
        assert_eq!(snap.encodes_total, 2);
        assert_eq!(snap.encode_errors, 1);
        assert_eq!(snap.bytes_encoded, 10);
        assert_eq!(snap.decodes_total, 1);
        assert_eq!(snap.decode_errors, 0);
        assert_eq!(snap.unknown_fields_skipped, 3);
    }

    #[test]
    fn test_failed_decode_skips_not_counted() {
        let metrics = Metrics::new();
        metrics.decode_finished(None, 5);
        metrics.decode_finished(Some(4), 1);

        let snap = metrics.snapshot();
        assert_eq!(snap.decodes_total, 2);
        assert_eq!(snap.decode_errors, 1);
        assert_eq!(snap.unknown_fields_skipped, 1);
    }
}
