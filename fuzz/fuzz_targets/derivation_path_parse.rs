#![no_main]

use libfuzzer_sys::fuzz_target;
use ownproof_core::keys::DerivationPath;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(path) = DerivationPath::parse(s) {
            // Display output must parse back to the same path.
            let reparsed = DerivationPath::parse(&path.to_string());
            assert_eq!(reparsed.ok(), Some(path));
        }
    }
});
