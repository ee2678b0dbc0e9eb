#![no_main]

use gatecheck_core::DefaultConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(candidate) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let defaults = DefaultConfig::workshop_settings();
    let merged = defaults.merge(&candidate);
    assert!(merged.keys().map(String::as_str).eq(defaults.keys()));
});
