//! # Configuration Management
//!
//! Centralized configuration for the serialization engine.
//!
//! The engine never reads configuration from global or environment state on
//! its own. A host builds an [`IibinConfig`] (from defaults, a TOML file or
//! environment variables) and hands it to [`Registry::new`](crate::Registry::new).
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` / `from_toml()`
//! - Environment variables via `from_env()`
//! - Direct instantiation with defaults
//!
//! ## Safety Limits
//! - `max_schema_fields` caps fields per schema (default 1024)
//! - `max_recursion_depth` caps nested message depth (default 64, at most 100)
//! - Buffer arena size is bounded by `shm_total_memory_mb`

use crate::error::{IibinError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Default hard cap on fields per schema
pub const DEFAULT_MAX_SCHEMA_FIELDS: usize = 1024;

/// Default hard cap on nested message depth
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 64;

/// Upper bound accepted for `max_recursion_depth`
///
/// Encode and decode recurse once per nesting level, so this must stay
/// within what a default 2 MiB thread stack survives.
pub const MAX_RECURSION_DEPTH_LIMIT: usize = 100;

/// Default arena buffer size (64 KB)
pub const DEFAULT_BUFFER_SIZE_KB: usize = 64;

/// Default arena budget (64 MB)
pub const DEFAULT_SHM_TOTAL_MEMORY_MB: usize = 64;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct IibinConfig {
    /// Schema and codec limits
    #[serde(default)]
    pub codec: CodecConfig,

    /// Buffer arena configuration
    #[serde(default)]
    pub buffers: BufferConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl IibinConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| IibinError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| IibinError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| IibinError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    ///
    /// Host-side helper; nothing inside the engine calls this.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("IIBIN_MAX_SCHEMA_FIELDS") {
            config.codec.max_schema_fields = parse_env("IIBIN_MAX_SCHEMA_FIELDS", &val)?;
        }

        if let Ok(val) = std::env::var("IIBIN_MAX_RECURSION_DEPTH") {
            config.codec.max_recursion_depth = parse_env("IIBIN_MAX_RECURSION_DEPTH", &val)?;
        }

        if let Ok(val) = std::env::var("IIBIN_STRING_INTERNING_ENABLE") {
            config.codec.string_interning_enable =
                parse_env("IIBIN_STRING_INTERNING_ENABLE", &val)?;
        }

        if let Ok(val) = std::env::var("IIBIN_USE_SHARED_MEMORY_BUFFERS") {
            config.buffers.use_shared_memory_buffers =
                parse_env("IIBIN_USE_SHARED_MEMORY_BUFFERS", &val)?;
        }

        if let Ok(val) = std::env::var("IIBIN_DEFAULT_BUFFER_SIZE_KB") {
            config.buffers.default_buffer_size_kb =
                parse_env("IIBIN_DEFAULT_BUFFER_SIZE_KB", &val)?;
        }

        if let Ok(val) = std::env::var("IIBIN_SHM_TOTAL_MEMORY_MB") {
            config.buffers.shm_total_memory_mb = parse_env("IIBIN_SHM_TOTAL_MEMORY_MB", &val)?;
        }

        if let Ok(path) = std::env::var("IIBIN_SHM_PATH") {
            config.buffers.shm_path = path;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| IibinError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| IibinError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.codec.validate());
        errors.extend(self.buffers.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(IibinError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| IibinError::ConfigError(format!("Invalid value for {name}: '{raw}'")))
}

/// Schema and codec limits
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CodecConfig {
    /// Hard cap on fields per schema
    pub max_schema_fields: usize,

    /// Hard cap on nested message depth
    pub max_recursion_depth: usize,

    /// Share field and type name allocations across schemas
    pub string_interning_enable: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_schema_fields: DEFAULT_MAX_SCHEMA_FIELDS,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            string_interning_enable: true,
        }
    }
}

impl CodecConfig {
    /// Validate codec configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_schema_fields == 0 {
            errors.push("Max schema fields must be greater than 0".to_string());
        } else if self.max_schema_fields > crate::core::wire::MAX_TAG as usize {
            errors.push(format!(
                "Max schema fields too large: {} (maximum: {})",
                self.max_schema_fields,
                crate::core::wire::MAX_TAG
            ));
        }

        if self.max_recursion_depth == 0 {
            errors.push("Max recursion depth must be greater than 0".to_string());
        } else if self.max_recursion_depth > MAX_RECURSION_DEPTH_LIMIT {
            errors.push(format!(
                "Max recursion depth too large: {} (maximum: {MAX_RECURSION_DEPTH_LIMIT})",
                self.max_recursion_depth
            ));
        }

        errors
    }
}

/// Buffer arena configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BufferConfig {
    /// Borrow encode buffers from a bounded arena
    pub use_shared_memory_buffers: bool,

    /// Size of each arena buffer in KB
    pub default_buffer_size_kb: usize,

    /// Total arena budget in MB
    pub shm_total_memory_mb: usize,

    /// Backing path advertised to hosts that map the arena
    pub shm_path: String,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            use_shared_memory_buffers: false,
            default_buffer_size_kb: DEFAULT_BUFFER_SIZE_KB,
            shm_total_memory_mb: DEFAULT_SHM_TOTAL_MEMORY_MB,
            shm_path: String::from("/iibin_shm"),
        }
    }
}

impl BufferConfig {
    /// Size of one arena buffer in bytes
    pub fn buffer_size_bytes(&self) -> usize {
        self.default_buffer_size_kb.saturating_mul(1024)
    }

    /// Total arena budget in bytes
    pub fn total_bytes(&self) -> usize {
        self.shm_total_memory_mb.saturating_mul(1024 * 1024)
    }

    /// Validate buffer configuration (only checked when the arena is enabled)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.use_shared_memory_buffers {
            return errors;
        }

        if self.default_buffer_size_kb == 0 {
            errors.push("Default buffer size must be greater than 0".to_string());
        }

        if self.shm_total_memory_mb == 0 {
            errors.push("Shared memory budget must be greater than 0".to_string());
        } else if self.buffer_size_bytes() > self.total_bytes() {
            errors.push(format!(
                "Buffer size ({} KB) exceeds shared memory budget ({} MB)",
                self.default_buffer_size_kb, self.shm_total_memory_mb
            ));
        }

        if self.shm_path.is_empty() {
            errors.push("Shared memory path cannot be empty".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("iibin"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
