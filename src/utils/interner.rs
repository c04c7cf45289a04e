//! String interning for schema names.
//!
//! When enabled, identical field and type names across every compiled schema
//! share one `Arc<str>` allocation. When disabled each call allocates.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Thread-safe pool of shared strings
#[derive(Debug, Default)]
pub struct StringInterner {
    enabled: bool,
    strings: Mutex<HashSet<Arc<str>>>,
}

impl StringInterner {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            strings: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the shared copy of `s`, inserting it on first use
    pub fn intern(&self, s: &str) -> Arc<str> {
        if !self.enabled {
            return Arc::from(s);
        }

        match self.strings.lock() {
            Ok(mut strings) => {
                if let Some(existing) = strings.get(s) {
                    return Arc::clone(existing);
                }
                let shared: Arc<str> = Arc::from(s);
                strings.insert(Arc::clone(&shared));
                shared
            }
            // Poisoned pool: fall back to an unshared allocation
            Err(_) => Arc::from(s),
        }
    }

    /// Number of distinct interned strings
    pub fn len(&self) -> usize {
        self.strings.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
