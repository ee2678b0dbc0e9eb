#![no_main]

use gatecheck_core::token::peek;
use gatecheck_core::{Algorithm, Rejection, TokenVerifier, TrustedKeyMaterial};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(token) = std::str::from_utf8(data) else {
        return;
    };
    let _ = peek(token);

    let Ok(material) =
        TrustedKeyMaterial::hmac(Algorithm::HS256, b"fuzz_secret_value_of_thirty_two_b")
    else {
        return;
    };
    let verdict = TokenVerifier::new(material).verify(token);
    if let Ok(h) = peek(token) {
        if h.declares_none() {
            assert_eq!(verdict, Err(Rejection::AlgorithmMismatch));
        }
    }
});
