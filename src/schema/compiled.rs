//! Schema and enum compilation.
//!
//! Compilation validates a definition in full before producing anything, so
//! a failed definition never leaves partial state behind. Compiled values are
//! immutable once built.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::codec::scalar::normalize_default;
use crate::core::value::Value;
use crate::core::wire::MAX_TAG;
use crate::error::{constants, IibinError, Result};
use crate::schema::field::{FieldDefinition, FieldLabel, FieldType};
use crate::utils::interner::StringInterner;

/// A validated field inside a compiled schema
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledField {
    pub name: Arc<str>,
    pub tag: u32,
    pub field_type: FieldType,
    pub label: FieldLabel,
    pub packed: bool,
    pub nested_type_name: Option<Arc<str>>,
    pub default_value: Option<Value>,
    pub deprecated: bool,
}

impl CompiledField {
    #[inline]
    pub fn is_required(&self) -> bool {
        self.label == FieldLabel::Required
    }

    #[inline]
    pub fn is_repeated(&self) -> bool {
        self.label == FieldLabel::Repeated
    }

    /// Referenced schema/enum name; empty for scalar fields
    #[inline]
    pub fn nested_type(&self) -> &str {
        self.nested_type_name.as_deref().unwrap_or("")
    }
}

/// A schema compiled for fast lookup by tag (decoder) and by name (encoder)
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    name: String,
    ordered_fields: Vec<CompiledField>,
    fields_by_tag: HashMap<u32, usize>,
    fields_by_name: HashMap<Arc<str>, usize>,
}

impl CompiledSchema {
    /// Validate `fields` and build the lookup tables.
    ///
    /// # Errors
    /// - `SchemaFieldLimitExceeded` when `fields` is longer than `max_fields`
    /// - `InvalidFieldDefinition` for the first field failing validation
    pub fn compile(
        name: &str,
        fields: Vec<FieldDefinition>,
        max_fields: usize,
        interner: &StringInterner,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(IibinError::invalid_field(name, "", constants::ERR_EMPTY_NAME));
        }
        if fields.len() > max_fields {
            return Err(IibinError::SchemaFieldLimitExceeded {
                schema: name.to_string(),
                count: fields.len(),
                limit: max_fields,
            });
        }

        let mut ordered_fields = Vec::with_capacity(fields.len());
        let mut fields_by_tag = HashMap::with_capacity(fields.len());
        let mut fields_by_name = HashMap::with_capacity(fields.len());

        for def in fields {
            validate_field(name, &def)?;

            if fields_by_tag.contains_key(&def.tag) {
                return Err(IibinError::invalid_field(
                    name,
                    &def.name,
                    constants::ERR_DUPLICATE_TAG,
                ));
            }
            if fields_by_name.contains_key(def.name.as_str()) {
                return Err(IibinError::invalid_field(
                    name,
                    &def.name,
                    constants::ERR_DUPLICATE_NAME,
                ));
            }

            let field_name = interner.intern(&def.name);
            let index = ordered_fields.len();
            fields_by_tag.insert(def.tag, index);
            fields_by_name.insert(Arc::clone(&field_name), index);
            ordered_fields.push(CompiledField {
                name: field_name,
                tag: def.tag,
                field_type: def.field_type,
                label: def.label,
                packed: def.packed,
                nested_type_name: def.nested_type_name.as_deref().map(|n| interner.intern(n)),
                default_value: def
                    .default_value
                    .as_ref()
                    .and_then(|v| normalize_default(def.field_type, v)),
                deprecated: def.deprecated,
            });
        }

        Ok(Self {
            name: name.to_string(),
            ordered_fields,
            fields_by_tag,
            fields_by_name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in definition order
    pub fn fields(&self) -> &[CompiledField] {
        &self.ordered_fields
    }

    pub fn field_by_tag(&self, tag: u32) -> Option<&CompiledField> {
        self.fields_by_tag.get(&tag).map(|&i| &self.ordered_fields[i])
    }

    pub fn field_by_name(&self, name: &str) -> Option<&CompiledField> {
        self.fields_by_name.get(name).map(|&i| &self.ordered_fields[i])
    }

    pub fn len(&self) -> usize {
        self.ordered_fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_fields.is_empty()
    }
}

fn validate_field(schema: &str, def: &FieldDefinition) -> Result<()> {
    let fail = |reason: &str| Err(IibinError::invalid_field(schema, &def.name, reason));

    if def.name.is_empty() {
        return fail(constants::ERR_EMPTY_NAME);
    }
    if def.tag == 0 {
        return fail(constants::ERR_ZERO_TAG);
    }
    if def.tag > MAX_TAG {
        return fail(constants::ERR_TAG_TOO_LARGE);
    }

    let has_nested = def
        .nested_type_name
        .as_deref()
        .is_some_and(|n| !n.is_empty());
    if def.field_type.needs_nested_type() && !has_nested {
        return fail(constants::ERR_MISSING_NESTED_TYPE);
    }
    if !def.field_type.needs_nested_type() && def.nested_type_name.is_some() {
        return fail(constants::ERR_UNEXPECTED_NESTED_TYPE);
    }

    if def.packed {
        if def.label != FieldLabel::Repeated {
            return fail(constants::ERR_PACKED_NOT_REPEATED);
        }
        if !def.field_type.is_packable() {
            return fail(constants::ERR_PACKED_NOT_NUMERIC);
        }
    }

    if let Some(default) = &def.default_value {
        if def.label == FieldLabel::Repeated {
            return fail(constants::ERR_DEFAULT_ON_REPEATED);
        }
        if def.field_type == FieldType::Message {
            return fail(constants::ERR_DEFAULT_ON_MESSAGE);
        }
        if normalize_default(def.field_type, default).is_none() {
            return fail(constants::ERR_DEFAULT_TYPE);
        }
    }

    Ok(())
}

/// A named enumeration with lookups in both directions
#[derive(Debug, Clone)]
pub struct CompiledEnum {
    name: String,
    values: Vec<(String, i32)>,
    values_by_name: HashMap<String, i32>,
    names_by_value: HashMap<i32, usize>,
}

impl CompiledEnum {
    /// Build an enum from `(name, value)` pairs in declaration order.
    ///
    /// Values may repeat (aliases); the first declared name is the canonical
    /// name returned when decoding an aliased value.
    pub fn compile<N, I>(name: &str, values: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, i32)>,
    {
        let invalid = |reason: String| IibinError::InvalidEnumDefinition {
            name: name.to_string(),
            reason,
        };

        if name.is_empty() {
            return Err(invalid(constants::ERR_EMPTY_NAME.to_string()));
        }

        let mut ordered = Vec::new();
        let mut values_by_name = HashMap::new();
        let mut names_by_value = HashMap::new();
        let mut seen = HashSet::new();

        for (value_name, number) in values {
            let value_name = value_name.into();
            if value_name.is_empty() {
                return Err(invalid(format!("value {number}: {}", constants::ERR_EMPTY_NAME)));
            }
            if !seen.insert(value_name.clone()) {
                return Err(invalid(format!(
                    "{value_name}: {}",
                    constants::ERR_DUPLICATE_ENUM_NAME
                )));
            }
            names_by_value.entry(number).or_insert(ordered.len());
            values_by_name.insert(value_name.clone(), number);
            ordered.push((value_name, number));
        }

        if ordered.is_empty() {
            return Err(invalid(constants::ERR_EMPTY_ENUM.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            values: ordered,
            values_by_name,
            names_by_value,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.values_by_name.get(name).copied()
    }

    /// Canonical name for a numeric value
    pub fn name_of(&self, value: i32) -> Option<&str> {
        self.names_by_value
            .get(&value)
            .map(|&i| self.values[i].0.as_str())
    }

    /// `(name, value)` pairs in declaration order
    pub fn values(&self) -> &[(String, i32)] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
