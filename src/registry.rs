//! # Schema Registry
//!
//! Owns compiled schemas and enums and runs encode/decode against them.
//!
//! ## Concurrency
//! Definitions are compiled outside any lock. Committing takes the write lock
//! only long enough to check name uniqueness and swap in a new immutable
//! snapshot. Encode and decode clone the current snapshot `Arc` and then run
//! without holding a lock, so readers never observe a partially-built
//! definition and committed schemas are never mutated.
//!
//! ## Usage
//! ```rust
//! use iibin::{FieldDefinition, FieldType, Registry, Value};
//!
//! let registry = Registry::default();
//! registry.define_enum("Role", [("GUEST", 0), ("ADMIN", 1)])?;
//! registry.define_schema(
//!     "User",
//!     vec![
//!         FieldDefinition::new("id", 1, FieldType::Int64).required(),
//!         FieldDefinition::new("name", 2, FieldType::String),
//!         FieldDefinition::enumeration("role", 3, "Role"),
//!     ],
//! )?;
//!
//! let user = Value::map([
//!     ("id", Value::from(42)),
//!     ("name", Value::from("ada")),
//!     ("role", Value::from("ADMIN")),
//! ]);
//! let bytes = registry.encode("User", &user)?;
//! let decoded = registry.decode("User", &bytes, false)?;
//! assert_eq!(decoded, user);
//! # Ok::<(), iibin::IibinError>(())
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, RwLock};

use bytes::{Bytes, BytesMut};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::codec::{Decoder, Encoder};
use crate::config::IibinConfig;
use crate::core::value::Value;
use crate::error::{constants, DefinitionKind, IibinError, Result};
use crate::schema::{CompiledEnum, CompiledSchema, FieldDefinition};
use crate::utils::buffer_pool::BufferArena;
use crate::utils::interner::StringInterner;
use crate::utils::metrics::{Metrics, Timer};

/// Immutable view of every committed definition
#[derive(Debug, Default)]
pub(crate) struct RegistrySnapshot {
    schemas: HashMap<String, Arc<CompiledSchema>>,
    enums: HashMap<String, Arc<CompiledEnum>>,
}

impl RegistrySnapshot {
    pub(crate) fn schema(&self, name: &str) -> Result<&CompiledSchema> {
        self.schemas
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| IibinError::SchemaNotFound(name.to_string()))
    }

    pub(crate) fn enum_def(&self, name: &str) -> Result<&CompiledEnum> {
        self.enums
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| IibinError::EnumNotFound(name.to_string()))
    }
}

/// Registry of compiled schemas and enums
#[derive(Debug)]
pub struct Registry {
    config: IibinConfig,
    state: RwLock<Arc<RegistrySnapshot>>,
    interner: StringInterner,
    arena: Option<BufferArena>,
    metrics: Metrics,
}

impl Default for Registry {
    fn default() -> Self {
        Self::build(IibinConfig::default())
    }
}

impl Registry {
    /// Create a registry with the given configuration
    ///
    /// # Errors
    /// Returns `ConfigError` if the configuration fails validation.
    pub fn new(config: IibinConfig) -> Result<Self> {
        config.validate_strict()?;
        Ok(Self::build(config))
    }

    fn build(config: IibinConfig) -> Self {
        Self {
            interner: StringInterner::new(config.codec.string_interning_enable),
            arena: BufferArena::from_config(&config.buffers),
            state: RwLock::new(Arc::new(RegistrySnapshot::default())),
            metrics: Metrics::new(),
            config,
        }
    }

    pub fn config(&self) -> &IibinConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Encode buffer arena, when enabled in the configuration
    pub fn arena(&self) -> Option<&BufferArena> {
        self.arena.as_ref()
    }

    fn snapshot(&self) -> Result<Arc<RegistrySnapshot>> {
        self.state
            .read()
            .map(|guard| Arc::clone(&*guard))
            .map_err(|_| IibinError::LockPoisoned(constants::ERR_REGISTRY_READ_LOCK.to_string()))
    }

    /// Define a named enum from `(name, value)` pairs
    ///
    /// # Errors
    /// - `InvalidEnumDefinition` for an empty name, no values or duplicate value names
    /// - `DuplicateDefinition` if an enum with this name already exists
    #[instrument(skip(self, values))]
    pub fn define_enum<N, I>(&self, name: &str, values: I) -> Result<()>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, i32)>,
    {
        let result = CompiledEnum::compile(name, values)
            .and_then(|compiled| self.commit(vec![compiled], Vec::new()));
        self.track(result)
    }

    /// Define a named schema from its field definitions
    ///
    /// Nested message/enum references are not checked here; they are
    /// resolved by name when encoding or decoding.
    ///
    /// # Errors
    /// - `InvalidFieldDefinition` for the first invalid field
    /// - `SchemaFieldLimitExceeded` beyond `max_schema_fields`
    /// - `DuplicateDefinition` if a schema with this name already exists
    #[instrument(skip(self, fields))]
    pub fn define_schema<I>(&self, name: &str, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = FieldDefinition>,
    {
        let result = CompiledSchema::compile(
            name,
            fields.into_iter().collect(),
            self.config.codec.max_schema_fields,
            &self.interner,
        )
        .and_then(|compiled| self.commit(Vec::new(), vec![compiled]));
        self.track(result)
    }

    /// Define every enum and schema of a TOML bundle in one atomic step
    ///
    /// ```toml
    /// [[enum]]
    /// name = "Status"
    /// values = [["UNKNOWN", 0], ["ACTIVE", 1]]
    ///
    /// [[schema]]
    /// name = "Account"
    ///
    /// [[schema.field]]
    /// name = "id"
    /// tag = 1
    /// type = "uint64"
    /// label = "required"
    /// ```
    #[instrument(skip(self, content), fields(len = content.len()))]
    pub fn define_from_toml(&self, content: &str) -> Result<()> {
        let result = self.define_bundle(content);
        self.track(result)
    }

    /// Load a TOML definition bundle from a file
    pub fn define_from_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            IibinError::ConfigError(format!("Failed to read definitions file: {e}"))
        })?;
        self.define_from_toml(&content)
    }

    fn define_bundle(&self, content: &str) -> Result<()> {
        let bundle: DefinitionBundle = toml::from_str(content)
            .map_err(|e| IibinError::ConfigError(format!("Failed to parse definitions: {e}")))?;

        let enums = bundle
            .enums
            .into_iter()
            .map(|spec| CompiledEnum::compile(&spec.name, spec.values.into_pairs()))
            .collect::<Result<Vec<_>>>()?;

        let schemas = bundle
            .schemas
            .into_iter()
            .map(|spec| {
                CompiledSchema::compile(
                    &spec.name,
                    spec.fields,
                    self.config.codec.max_schema_fields,
                    &self.interner,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        self.commit(enums, schemas)
    }

    fn track(&self, result: Result<()>) -> Result<()> {
        if let Err(e) = &result {
            self.metrics.definition_rejected();
            warn!(error = %e, "Definition rejected");
        }
        result
    }

    /// Publish compiled definitions; all of them or none.
    fn commit(&self, enums: Vec<CompiledEnum>, schemas: Vec<CompiledSchema>) -> Result<()> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| IibinError::LockPoisoned(constants::ERR_REGISTRY_WRITE_LOCK.to_string()))?;

        let mut enum_names = HashSet::new();
        for e in &enums {
            if guard.enums.contains_key(e.name()) || !enum_names.insert(e.name()) {
                return Err(IibinError::DuplicateDefinition {
                    kind: DefinitionKind::Enum,
                    name: e.name().to_string(),
                });
            }
        }

        let mut schema_names = HashSet::new();
        for s in &schemas {
            if guard.schemas.contains_key(s.name()) || !schema_names.insert(s.name()) {
                return Err(IibinError::DuplicateDefinition {
                    kind: DefinitionKind::Schema,
                    name: s.name().to_string(),
                });
            }
        }

        let (enum_count, schema_count) = (enums.len() as u64, schemas.len() as u64);
        let mut next = RegistrySnapshot {
            schemas: guard.schemas.clone(),
            enums: guard.enums.clone(),
        };
        for e in enums {
            debug!(name = e.name(), values = e.len(), "Enum defined");
            next.enums.insert(e.name().to_string(), Arc::new(e));
        }
        for s in schemas {
            debug!(name = s.name(), fields = s.len(), "Schema defined");
            next.schemas.insert(s.name().to_string(), Arc::new(s));
        }
        *guard = Arc::new(next);
        drop(guard);

        self.metrics.definitions_committed(schema_count, enum_count);
        Ok(())
    }

    pub fn is_schema_defined(&self, name: &str) -> bool {
        self.snapshot()
            .map(|s| s.schemas.contains_key(name))
            .unwrap_or(false)
    }

    pub fn is_enum_defined(&self, name: &str) -> bool {
        self.snapshot()
            .map(|s| s.enums.contains_key(name))
            .unwrap_or(false)
    }

    /// Names of all defined schemas, sorted
    pub fn defined_schemas(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .snapshot()
            .map(|s| s.schemas.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Names of all defined enums, sorted
    pub fn defined_enums(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .snapshot()
            .map(|s| s.enums.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn schema(&self, name: &str) -> Option<Arc<CompiledSchema>> {
        self.snapshot().ok()?.schemas.get(name).cloned()
    }

    pub fn enum_def(&self, name: &str) -> Option<Arc<CompiledEnum>> {
        self.snapshot().ok()?.enums.get(name).cloned()
    }

    /// Encode `value` (a map keyed by field name) against `schema`
    ///
    /// On error no bytes are returned.
    #[instrument(level = "debug", skip(self, value))]
    pub fn encode(&self, schema: &str, value: &Value) -> Result<Bytes> {
        let _timer = Timer::start("encode");
        let result = self.encode_inner(schema, value);
        self.metrics
            .encode_finished(result.as_ref().ok().map(|bytes| bytes.len()));
        result
    }

    fn encode_inner(&self, schema: &str, value: &Value) -> Result<Bytes> {
        let snapshot = self.snapshot()?;
        let encoder = Encoder::new(&snapshot, self.config.codec.max_recursion_depth);

        match &self.arena {
            Some(arena) => {
                // Released back to the arena when `buffer` drops, on every path
                let mut buffer = arena.acquire()?;
                encoder.encode(schema, value, &mut buffer)?;
                Ok(Bytes::copy_from_slice(&buffer))
            }
            None => {
                let mut buffer = BytesMut::new();
                encoder.encode(schema, value, &mut buffer)?;
                Ok(buffer.freeze())
            }
        }
    }

    /// Decode `bytes` against `schema`
    ///
    /// With `as_object` set, every declared field is present in the result
    /// (absent scalars as their default or `Null`, absent repeated fields as
    /// an empty list). Otherwise only observed fields and declared defaults
    /// appear.
    #[instrument(level = "debug", skip(self, bytes), fields(len = bytes.len()))]
    pub fn decode(&self, schema: &str, bytes: &[u8], as_object: bool) -> Result<Value> {
        let _timer = Timer::start("decode");
        let snapshot = self.snapshot()?;
        let mut decoder = Decoder::new(&snapshot, self.config.codec.max_recursion_depth);

        let result = decoder.decode(schema, bytes, as_object);
        self.metrics.decode_finished(
            result.as_ref().ok().map(|_| bytes.len()),
            decoder.unknown_fields(),
        );
        result
    }
}

#[derive(Debug, Deserialize)]
struct DefinitionBundle {
    #[serde(default, rename = "enum")]
    enums: Vec<EnumSpec>,
    #[serde(default, rename = "schema")]
    schemas: Vec<SchemaSpec>,
}

#[derive(Debug, Deserialize)]
struct EnumSpec {
    name: String,
    values: EnumValues,
}

/// Enum values as ordered pairs or as a table (sorted by name)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EnumValues {
    Ordered(Vec<(String, i32)>),
    Table(BTreeMap<String, i32>),
}

impl EnumValues {
    fn into_pairs(self) -> Vec<(String, i32)> {
        match self {
            EnumValues::Ordered(pairs) => pairs,
            EnumValues::Table(table) => table.into_iter().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SchemaSpec {
    name: String,
    #[serde(default, rename = "field")]
    fields: Vec<FieldDefinition>,
}
