//! # Buffer Arena
//!
//! Bounded pool of encode buffers sized from the shared-memory settings.
//!
//! The arena holds at most `total_bytes / buffer_size` buffers. A buffer is
//! acquired before an encode and released when its guard drops, so every
//! exit path (including errors) returns it. Acquiring past the budget fails
//! with `BufferArenaExhausted` instead of allocating. A released buffer that
//! grew past the slot size is freed rather than kept, so idle buffers never
//! hold more than the configured budget.
//!
//! ## Usage
//! ```rust
//! use iibin::utils::buffer_pool::BufferArena;
//!
//! let arena = BufferArena::new(4096, 4096 * 4); // four 4 KB buffers
//! let mut buffer = arena.acquire().expect("arena has room");
//! buffer.extend_from_slice(b"payload");
//! assert_eq!(arena.available(), 3);
//! drop(buffer); // returned to the arena
//! assert_eq!(arena.available(), 4);
//! ```

use std::sync::{Arc, Mutex};

use bytes::BytesMut;
use tracing::{debug, warn};

use crate::config::BufferConfig;
use crate::error::{constants, IibinError, Result};

#[derive(Debug)]
struct ArenaState {
    free: Vec<BytesMut>,
    in_use: usize,
}

/// A borrowed arena buffer that returns itself when dropped
#[derive(Debug)]
pub struct ArenaBuffer {
    buffer: BytesMut,
    state: Arc<Mutex<ArenaState>>,
    buffer_size: usize,
}

impl Drop for ArenaBuffer {
    fn drop(&mut self) {
        let mut buffer = std::mem::take(&mut self.buffer);
        if let Ok(mut state) = self.state.lock() {
            state.in_use = state.in_use.saturating_sub(1);
            if buffer.capacity() <= self.buffer_size {
                buffer.clear();
                state.free.push(buffer);
            }
        }
    }
}

impl std::ops::Deref for ArenaBuffer {
    type Target = BytesMut;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl std::ops::DerefMut for ArenaBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

/// Thread-safe, fixed-budget buffer arena
#[derive(Debug, Clone)]
pub struct BufferArena {
    state: Arc<Mutex<ArenaState>>,
    buffer_size: usize,
    capacity: usize,
    path: Option<String>,
}

impl BufferArena {
    /// Create an arena of `total_bytes / buffer_size` buffers (at least one)
    pub fn new(buffer_size: usize, total_bytes: usize) -> Self {
        let buffer_size = buffer_size.max(1);
        let capacity = (total_bytes / buffer_size).max(1);
        Self {
            state: Arc::new(Mutex::new(ArenaState {
                free: Vec::new(),
                in_use: 0,
            })),
            buffer_size,
            capacity,
            path: None,
        }
    }

    /// Build the arena described by `config`, or `None` when disabled
    pub fn from_config(config: &BufferConfig) -> Option<Self> {
        if !config.use_shared_memory_buffers {
            return None;
        }
        let mut arena = Self::new(config.buffer_size_bytes(), config.total_bytes());
        arena.path = Some(config.shm_path.clone());
        debug!(
            buffer_size = arena.buffer_size,
            capacity = arena.capacity,
            shm_path = %config.shm_path,
            "Buffer arena created"
        );
        Some(arena)
    }

    /// Borrow a buffer, reusing a released one when possible
    pub fn acquire(&self) -> Result<ArenaBuffer> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| IibinError::LockPoisoned(constants::ERR_LOCK_POISONED.to_string()))?;

        if state.in_use >= self.capacity {
            warn!(in_use = state.in_use, "{}", constants::ERR_ARENA_EXHAUSTED);
            return Err(IibinError::BufferArenaExhausted(state.in_use));
        }

        let buffer = state
            .free
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.buffer_size));
        state.in_use += 1;

        Ok(ArenaBuffer {
            buffer,
            state: Arc::clone(&self.state),
            buffer_size: self.buffer_size,
        })
    }

    /// Number of buffers that can still be acquired
    pub fn available(&self) -> usize {
        self.state
            .lock()
            .map(|s| self.capacity.saturating_sub(s.in_use))
            .unwrap_or(0)
    }

    /// Bytes currently held by idle buffers
    pub fn retained_bytes(&self) -> usize {
        self.state
            .lock()
            .map(|s| s.free.iter().map(BytesMut::capacity).sum())
            .unwrap_or(0)
    }

    /// Maximum number of simultaneously borrowed buffers
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Backing path from the configuration, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn test_arena_basic() {
        let arena = BufferArena::new(1024, 1024 * 10);
        assert_eq!(arena.capacity(), 10);
        assert_eq!(arena.available(), 10);

        let mut buf = arena.acquire().unwrap();
        assert_eq!(arena.available(), 9);

        buf.extend_from_slice(&[42]);
        assert_eq!(buf[0], 42);

        drop(buf);
        assert_eq!(arena.available(), 10);
    }

    #[test]
    fn test_arena_reuse() {
        let arena = BufferArena::new(64, 64);

        {
            let mut buf1 = arena.acquire().unwrap();
            buf1.extend_from_slice(b"test");
            assert_eq!(buf1.len(), 4);
        }

        // Buffer should be returned and cleared
        let buf2 = arena.acquire().unwrap();
        assert_eq!(buf2.len(), 0);
        assert!(buf2.capacity() >= 4);
    }

    #[test]
    fn test_arena_exhaustion() {
        let arena = BufferArena::new(1024, 2048);
        let _a = arena.acquire().unwrap();
        let _b = arena.acquire().unwrap();
        assert_eq!(
            arena.acquire().unwrap_err(),
            IibinError::BufferArenaExhausted(2)
        );
    }

    #[test]
    fn test_oversized_buffer_not_retained() {
        let arena = BufferArena::new(16, 16);
        {
            let mut buf = arena.acquire().unwrap();
            buf.extend_from_slice(&[0u8; 17]);
        }

        // Slot is released even though the buffer itself was dropped
        assert_eq!(arena.available(), 1);
        assert_eq!(arena.retained_bytes(), 0);
        let buf = arena.acquire().unwrap();
        assert!(buf.capacity() <= 16);
    }

    #[test]
    fn test_idle_buffers_within_budget() {
        let arena = BufferArena::new(64, 64 * 4);
        let held: Vec<_> = (0..4)
            .map(|i| {
                let mut buf = arena.acquire().unwrap();
                buf.extend_from_slice(&vec![0u8; 32 + i * 32]);
                buf
            })
            .collect();
        drop(held);

        assert_eq!(arena.available(), 4);
        assert!(arena.retained_bytes() <= 64 * 4);
    }

    #[test]
    fn test_from_config_disabled() {
        assert!(BufferArena::from_config(&BufferConfig::default()).is_none());

        let config = BufferConfig {
            use_shared_memory_buffers: true,
            default_buffer_size_kb: 4,
            shm_total_memory_mb: 1,
            shm_path: "/tmp/iibin".into(),
        };
        let arena = BufferArena::from_config(&config).expect("enabled");
        assert_eq!(arena.capacity(), 256);
        assert_eq!(arena.path(), Some("/tmp/iibin"));
    }
}
