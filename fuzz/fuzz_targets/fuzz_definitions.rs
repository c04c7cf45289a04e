#![no_main]

use iibin::Registry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // TOML definition bundles from untrusted sources must fail cleanly
    if let Ok(text) = std::str::from_utf8(data) {
        let registry = Registry::default();
        let _ = registry.define_from_toml(text);
    }
});
