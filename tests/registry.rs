//! Schema and enum definition tests

#![allow(clippy::unwrap_used, clippy::expect_used)]

use iibin::error::DefinitionKind;
use iibin::{FieldDefinition, FieldLabel, FieldType, IibinConfig, IibinError, Registry, Value};

fn fields(n: u32) -> Vec<FieldDefinition> {
    (1..=n)
        .map(|tag| FieldDefinition::new(format!("f{tag}"), tag, FieldType::UInt32))
        .collect()
}

// ============================================================================
// SCHEMA DEFINITION
// ============================================================================

#[test]
fn test_define_and_query_schema() {
    let registry = Registry::default();
    assert!(!registry.is_schema_defined("User"));

    registry
        .define_schema(
            "User",
            vec![
                FieldDefinition::new("id", 1, FieldType::Int64).required(),
                FieldDefinition::new("tags", 7, FieldType::String).repeated(),
            ],
        )
        .unwrap();

    assert!(registry.is_schema_defined("User"));
    let schema = registry.schema("User").unwrap();
    assert_eq!(schema.name(), "User");
    assert_eq!(schema.len(), 2);
    assert_eq!(schema.field_by_tag(7).unwrap().label, FieldLabel::Repeated);
    assert_eq!(&*schema.field_by_name("id").unwrap().name, "id");
    assert_eq!(registry.metrics().snapshot().schemas_defined, 1);
}

#[test]
fn test_non_contiguous_tags() {
    let registry = Registry::default();
    registry
        .define_schema(
            "Sparse",
            vec![
                FieldDefinition::new("a", 1, FieldType::Bool),
                FieldDefinition::new("b", 1000, FieldType::Bool),
                FieldDefinition::new("c", iibin::core::wire::MAX_TAG, FieldType::Bool),
            ],
        )
        .unwrap();

    let value = Value::map([("a", true), ("b", true), ("c", true)]);
    let bytes = registry.encode("Sparse", &value).unwrap();
    assert_eq!(registry.decode("Sparse", &bytes, false).unwrap(), value);
}

#[test]
fn test_empty_schema_is_allowed() {
    let registry = Registry::default();
    registry.define_schema("Empty", Vec::new()).unwrap();
    let bytes = registry.encode("Empty", &Value::map::<&str, Value, _>([])).unwrap();
    assert!(bytes.is_empty());
    assert_eq!(
        registry.decode("Empty", &[], true).unwrap(),
        Value::map::<&str, Value, _>([])
    );
}

#[test]
fn test_field_limit_exceeded() {
    let config = IibinConfig::default_with_overrides(|c| c.codec.max_schema_fields = 3);
    let registry = Registry::new(config).unwrap();

    registry.define_schema("AtLimit", fields(3)).unwrap();
    let err = registry.define_schema("Over", fields(4)).unwrap_err();
    assert_eq!(
        err,
        IibinError::SchemaFieldLimitExceeded {
            schema: "Over".into(),
            count: 4,
            limit: 3
        }
    );
    assert!(!registry.is_schema_defined("Over"));
    assert_eq!(registry.metrics().snapshot().definitions_rejected, 1);
}

#[test]
fn test_duplicate_schema_rejected() {
    let registry = Registry::default();
    registry.define_schema("A", fields(1)).unwrap();
    let err = registry.define_schema("A", fields(2)).unwrap_err();
    assert_eq!(
        err,
        IibinError::DuplicateDefinition {
            kind: DefinitionKind::Schema,
            name: "A".into()
        }
    );
    // The original definition is untouched
    assert_eq!(registry.schema("A").unwrap().len(), 1);
}

#[test]
fn test_schema_and_enum_namespaces_are_separate() {
    let registry = Registry::default();
    registry.define_schema("Shared", fields(1)).unwrap();
    registry.define_enum("Shared", [("ZERO", 0)]).unwrap();
    assert!(registry.is_schema_defined("Shared"));
    assert!(registry.is_enum_defined("Shared"));
}

#[test]
fn test_invalid_field_definitions() {
    let registry = Registry::default();
    let cases = vec![
        ("zero tag", vec![FieldDefinition::new("a", 0, FieldType::Int32)]),
        (
            "tag too large",
            vec![FieldDefinition::new("a", iibin::core::wire::MAX_TAG + 1, FieldType::Int32)],
        ),
        ("empty name", vec![FieldDefinition::new("", 1, FieldType::Int32)]),
        (
            "duplicate tag",
            vec![
                FieldDefinition::new("a", 1, FieldType::Int32),
                FieldDefinition::new("b", 1, FieldType::Int32),
            ],
        ),
        (
            "duplicate name",
            vec![
                FieldDefinition::new("a", 1, FieldType::Int32),
                FieldDefinition::new("a", 2, FieldType::Int32),
            ],
        ),
        ("message without type", vec![FieldDefinition::new("m", 1, FieldType::Message)]),
        ("enum without type", vec![FieldDefinition::new("e", 1, FieldType::Enum)]),
        (
            "nested type on scalar",
            vec![FieldDefinition::new("s", 1, FieldType::Int32).nested("Other")],
        ),
        (
            "packed string",
            vec![FieldDefinition::new("s", 1, FieldType::String).packed()],
        ),
        (
            "default on repeated",
            vec![FieldDefinition::new("r", 1, FieldType::Int32)
                .repeated()
                .with_default(1)],
        ),
        (
            "default of wrong type",
            vec![FieldDefinition::new("b", 1, FieldType::Bool).with_default("yes")],
        ),
    ];

    for (label, defs) in cases {
        let err = registry.define_schema("Bad", defs).unwrap_err();
        assert!(
            matches!(err, IibinError::InvalidFieldDefinition { .. }),
            "{label}: unexpected {err:?}"
        );
    }
    assert!(!registry.is_schema_defined("Bad"));
}

#[test]
fn test_packed_flag_requires_repeated() {
    let mut def = FieldDefinition::new("p", 1, FieldType::Int32);
    def.packed = true;
    let err = Registry::default().define_schema("P", vec![def]).unwrap_err();
    assert!(matches!(err, IibinError::InvalidFieldDefinition { .. }));
}

#[test]
fn test_forward_references_resolve_lazily() {
    let registry = Registry::default();
    registry
        .define_schema("Outer", vec![FieldDefinition::message("inner", 1, "Inner")])
        .unwrap();

    let value = Value::map([("inner", Value::map([("x", 1)]))]);
    assert_eq!(
        registry.encode("Outer", &value).unwrap_err(),
        IibinError::SchemaNotFound("Inner".into())
    );

    registry
        .define_schema("Inner", vec![FieldDefinition::new("x", 1, FieldType::Int32)])
        .unwrap();
    let bytes = registry.encode("Outer", &value).unwrap();
    assert_eq!(registry.decode("Outer", &bytes, false).unwrap(), value);
}

// ============================================================================
// ENUM DEFINITION
// ============================================================================

#[test]
fn test_enum_lookups() {
    let registry = Registry::default();
    registry
        .define_enum("Status", [("UNKNOWN", 0), ("ACTIVE", 1), ("DELETED", -1)])
        .unwrap();

    let status = registry.enum_def("Status").unwrap();
    assert_eq!(status.value_of("ACTIVE"), Some(1));
    assert_eq!(status.name_of(-1), Some("DELETED"));
    assert_eq!(status.name_of(7), None);
    assert_eq!(status.len(), 3);
}

#[test]
fn test_enum_aliases_keep_first_name() {
    let registry = Registry::default();
    registry
        .define_enum("Mode", [("OFF", 0), ("ON", 1), ("ENABLED", 1)])
        .unwrap();
    let mode = registry.enum_def("Mode").unwrap();
    assert_eq!(mode.value_of("ENABLED"), Some(1));
    assert_eq!(mode.name_of(1), Some("ON"));
}

#[test]
fn test_invalid_enums() {
    let registry = Registry::default();
    assert!(matches!(
        registry.define_enum("Empty", Vec::<(&str, i32)>::new()),
        Err(IibinError::InvalidEnumDefinition { .. })
    ));
    assert!(matches!(
        registry.define_enum("Dup", [("A", 0), ("A", 1)]),
        Err(IibinError::InvalidEnumDefinition { .. })
    ));
    assert!(matches!(
        registry.define_enum("", [("A", 0)]),
        Err(IibinError::InvalidEnumDefinition { .. })
    ));

    registry.define_enum("Once", [("A", 0)]).unwrap();
    assert_eq!(
        registry.define_enum("Once", [("B", 1)]).unwrap_err(),
        IibinError::DuplicateDefinition {
            kind: DefinitionKind::Enum,
            name: "Once".into()
        }
    );
}

// ============================================================================
// TOML BUNDLES
// ============================================================================

#[test]
fn test_define_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("defs.toml");
    std::fs::write(
        &path,
        r#"
        [[enum]]
        name = "Kind"
        values = [["A", 0], ["B", 1]]

        [[schema]]
        name = "Item"

        [[schema.field]]
        name = "kind"
        tag = 1
        type = "enum"
        nested_type = "Kind"

        [[schema.field]]
        name = "weights"
        tag = 2
        type = "double"
        label = "repeated"
        packed = true
        "#,
    )
    .unwrap();

    let registry = Registry::default();
    registry.define_from_file(&path).unwrap();

    let value = Value::map([
        ("kind", Value::from("B")),
        ("weights", Value::list([0.5, 1.5])),
    ]);
    let bytes = registry.encode("Item", &value).unwrap();
    assert_eq!(registry.decode("Item", &bytes, false).unwrap(), value);
}

#[test]
fn test_define_from_missing_file() {
    let registry = Registry::default();
    let err = registry
        .define_from_file("/nonexistent/iibin/defs.toml")
        .unwrap_err();
    assert!(matches!(err, IibinError::ConfigError(_)));
}
