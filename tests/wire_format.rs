//! Wire-level compatibility tests
//!
//! Byte layouts checked here follow the protobuf encoding so that IIBIN
//! output can be read by any protobuf decoder given the equivalent schema.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use iibin::core::wire::{
    decode_varint, encode_varint, make_key, split_key, zigzag_decode32, zigzag_decode64,
    zigzag_encode32, zigzag_encode64, WireReader, WireType, MAX_TAG,
};
use iibin::{FieldDefinition, FieldType, IibinError, Registry, Value};

#[test]
fn test_varint_reference_layouts() {
    let cases: &[(u64, &[u8])] = &[
        (0, &[0x00]),
        (1, &[0x01]),
        (127, &[0x7F]),
        (128, &[0x80, 0x01]),
        (150, &[0x96, 0x01]),
        (300, &[0xAC, 0x02]),
        (16_383, &[0xFF, 0x7F]),
        (16_384, &[0x80, 0x80, 0x01]),
    ];
    for &(value, bytes) in cases {
        assert_eq!(encode_varint(value), bytes, "encoding {value}");
        assert_eq!(decode_varint(bytes).unwrap(), (value, bytes.len()));
    }
}

#[test]
fn test_varint_u64_max_is_ten_bytes() {
    let bytes = encode_varint(u64::MAX);
    assert_eq!(bytes.len(), 10);
    assert_eq!(bytes[9], 0x01);
    assert_eq!(decode_varint(&bytes).unwrap(), (u64::MAX, 10));
}

#[test]
fn test_varint_rejects_overlong() {
    let mut eleven = vec![0x80; 10];
    eleven.push(0x00);
    assert_eq!(decode_varint(&eleven), Err(IibinError::MalformedVarint));

    let mut overflow = vec![0xFF; 9];
    overflow.push(0x02);
    assert_eq!(decode_varint(&overflow), Err(IibinError::MalformedVarint));
}

#[test]
fn test_varint_truncated() {
    assert!(matches!(
        decode_varint(&[0x80, 0x80]),
        Err(IibinError::TruncatedBuffer { .. })
    ));
    assert!(matches!(
        decode_varint(&[]),
        Err(IibinError::TruncatedBuffer { .. })
    ));
}

#[test]
fn test_zigzag_reference_values() {
    assert_eq!(zigzag_encode32(0), 0);
    assert_eq!(zigzag_encode32(-1), 1);
    assert_eq!(zigzag_encode32(1), 2);
    assert_eq!(zigzag_encode32(-2), 3);
    assert_eq!(zigzag_encode32(i32::MAX), u32::MAX - 1);
    assert_eq!(zigzag_encode32(i32::MIN), u32::MAX);
    assert_eq!(zigzag_decode32(u32::MAX), i32::MIN);

    assert_eq!(zigzag_encode64(i64::MIN), u64::MAX);
    assert_eq!(zigzag_decode64(u64::MAX - 1), i64::MAX);
}

#[test]
fn test_keys() {
    assert_eq!(make_key(1, WireType::Varint), 0x08);
    assert_eq!(make_key(2, WireType::LengthDelimited), 0x12);
    assert_eq!(make_key(3, WireType::Fixed64), 0x19);
    assert_eq!(make_key(4, WireType::Fixed32), 0x25);

    assert_eq!(split_key(0x12).unwrap(), (2, WireType::LengthDelimited));
    assert_eq!(
        split_key(make_key(MAX_TAG, WireType::Varint)).unwrap(),
        (MAX_TAG, WireType::Varint)
    );
    // Tag 0 and group wire types (3, 4) are invalid
    assert_eq!(split_key(0x00), Err(IibinError::InvalidKey(0x00)));
    assert_eq!(split_key(0x0B), Err(IibinError::InvalidKey(0x0B)));
    assert_eq!(split_key(0x0C), Err(IibinError::InvalidKey(0x0C)));
}

#[test]
fn test_reader_skip_each_wire_type() {
    let data = [
        0x96, 0x01, // varint
        1, 2, 3, 4, 5, 6, 7, 8, // fixed64
        0x02, 0xAA, 0xBB, // length-delimited
        9, 9, 9, 9, // fixed32
    ];
    let mut reader = WireReader::new(&data);
    reader.skip(WireType::Varint).unwrap();
    assert_eq!(reader.position(), 2);
    reader.skip(WireType::Fixed64).unwrap();
    reader.skip(WireType::LengthDelimited).unwrap();
    reader.skip(WireType::Fixed32).unwrap();
    assert!(reader.is_empty());
    assert!(reader.skip(WireType::Fixed32).is_err());
}

#[test]
fn test_classic_protobuf_message() {
    // message Test1 { int32 a = 1; }  a = 150  =>  08 96 01
    let registry = Registry::default();
    registry
        .define_schema("Test1", vec![FieldDefinition::new("a", 1, FieldType::Int32)])
        .unwrap();
    let bytes = registry
        .encode("Test1", &Value::map([("a", 150)]))
        .unwrap();
    assert_eq!(&bytes[..], &[0x08, 0x96, 0x01]);

    // message Test2 { string b = 2; }  b = "testing"
    registry
        .define_schema("Test2", vec![FieldDefinition::new("b", 2, FieldType::String)])
        .unwrap();
    let bytes = registry
        .encode("Test2", &Value::map([("b", "testing")]))
        .unwrap();
    assert_eq!(
        &bytes[..],
        &[0x12, 0x07, b't', b'e', b's', b't', b'i', b'n', b'g']
    );

    // message Test3 { Test1 c = 3; }  =>  1a 03 08 96 01
    registry
        .define_schema("Test3", vec![FieldDefinition::message("c", 3, "Test1")])
        .unwrap();
    let nested = Value::map([("c", Value::map([("a", 150)]))]);
    let bytes = registry.encode("Test3", &nested).unwrap();
    assert_eq!(&bytes[..], &[0x1A, 0x03, 0x08, 0x96, 0x01]);
    assert_eq!(registry.decode("Test3", &bytes, false).unwrap(), nested);
}

#[test]
fn test_packed_reference_layout() {
    // message Test4 { repeated int32 d = 4 [packed=true]; }  d = [3, 270, 86942]
    let registry = Registry::default();
    registry
        .define_schema(
            "Test4",
            vec![FieldDefinition::new("d", 4, FieldType::Int32).packed()],
        )
        .unwrap();
    let value = Value::map([("d", Value::list([3, 270, 86942]))]);
    let bytes = registry.encode("Test4", &value).unwrap();
    assert_eq!(
        &bytes[..],
        &[0x22, 0x06, 0x03, 0x8E, 0x02, 0x9E, 0xA7, 0x05]
    );
    assert_eq!(registry.decode("Test4", &bytes, false).unwrap(), value);
}

#[test]
fn test_fixed_width_layouts() {
    let registry = Registry::default();
    registry
        .define_schema(
            "Fixed",
            vec![
                FieldDefinition::new("d", 1, FieldType::Double),
                FieldDefinition::new("f32", 2, FieldType::Fixed32),
                FieldDefinition::new("sf64", 3, FieldType::SFixed64),
            ],
        )
        .unwrap();
    let bytes = registry
        .encode(
            "Fixed",
            &Value::map([
                ("d", Value::from(1.0)),
                ("f32", Value::from(1u32)),
                ("sf64", Value::from(-1i64)),
            ]),
        )
        .unwrap();

    let mut expected = vec![0x09];
    expected.extend_from_slice(&1.0f64.to_le_bytes());
    expected.extend_from_slice(&[0x15, 0x01, 0x00, 0x00, 0x00]);
    expected.push(0x19);
    expected.extend_from_slice(&[0xFF; 8]);
    assert_eq!(&bytes[..], &expected[..]);
}

#[test]
fn test_fields_written_in_definition_order() {
    let registry = Registry::default();
    registry
        .define_schema(
            "Ordered",
            vec![
                FieldDefinition::new("late", 9, FieldType::Bool),
                FieldDefinition::new("early", 1, FieldType::Bool),
            ],
        )
        .unwrap();
    let bytes = registry
        .encode(
            "Ordered",
            &Value::map([("early", true), ("late", false)]),
        )
        .unwrap();
    assert_eq!(&bytes[..], &[0x48, 0x00, 0x08, 0x01]);
}
