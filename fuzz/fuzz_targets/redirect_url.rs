#![no_main]

use gatecheck_core::{RedirectGuard, RedirectOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(candidate) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(guard) = RedirectGuard::new(["example.com"], RedirectOptions::default()) else {
        return;
    };
    if let Ok(target) = guard.validate(candidate) {
        // Anything accepted is either an allow-listed absolute URL or a single-slash path.
        match url::Url::parse(&target) {
            Ok(u) => assert_eq!(u.host_str(), Some("example.com")),
            Err(_) => {
                assert!(target.starts_with('/'));
                assert!(!target.starts_with("//") && !target.starts_with("/\\"));
            }
        }
    }
});
