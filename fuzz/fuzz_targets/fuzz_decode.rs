#![no_main]

use std::sync::OnceLock;

use iibin::{FieldDefinition, FieldType, Registry};
use libfuzzer_sys::fuzz_target;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let registry = Registry::default();
        let _ = registry.define_enum("Kind", [("A", 0), ("B", 1), ("C", -1)]);
        let _ = registry.define_schema(
            "Node",
            vec![
                FieldDefinition::new("id", 1, FieldType::UInt64),
                FieldDefinition::new("name", 2, FieldType::String),
                FieldDefinition::new("score", 3, FieldType::Double),
                FieldDefinition::new("ratio", 4, FieldType::Float),
                FieldDefinition::new("delta", 5, FieldType::SInt64).packed(),
                FieldDefinition::new("blob", 6, FieldType::Bytes),
                FieldDefinition::enumeration("kind", 7, "Kind"),
                FieldDefinition::message("children", 8, "Node").repeated(),
                FieldDefinition::new("flags", 9, FieldType::Fixed32).repeated(),
            ],
        );
        registry
    })
}

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic; anything that decodes must re-encode
    let registry = registry();
    if let Ok(value) = registry.decode("Node", data, false) {
        let _ = registry.encode("Node", &value);
    }
    let _ = registry.decode("Node", data, true);
});
