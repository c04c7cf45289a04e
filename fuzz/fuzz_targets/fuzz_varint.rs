#![no_main]

use iibin::core::wire::{decode_varint, encode_varint};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((value, consumed)) = decode_varint(data) {
        assert!(consumed <= 10);
        // Canonical re-encoding is never longer than the input form
        assert!(encode_varint(value).len() <= consumed);
    }
});
