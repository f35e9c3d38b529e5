#![no_main]

use libfuzzer_sys::fuzz_target;
use ownproof_core::seed::{parse_mnemonic, parse_mnemonic_with, MnemonicOptions};

fuzz_target!(|data: &[u8]| {
    // Both validation modes must return Ok or Err, never panic.
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = parse_mnemonic(s);
        let _ = parse_mnemonic_with(s, MnemonicOptions::skip_checksum());
    }
});
