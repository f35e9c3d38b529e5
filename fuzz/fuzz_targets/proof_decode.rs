#![no_main]

use libfuzzer_sys::fuzz_target;
use ownproof_core::{parse_address, Network, ProofFormat};
use ownproof_message::verify_bip322;

const SEGWIT: &str = "bc1q9vza2e8x573nczrlzms0wvx3gsqjx7vavgkx0l";
const TAPROOT: &str = "bc1p78g3ksuml8syeq02t38u0dept6skr92chz70kkzs78y5n5kqtnhq4hs76h";

fuzz_target!(|data: &[u8]| {
    // Arbitrary text as a proof: every outcome must be a typed result.
    if let Ok(proof) = std::str::from_utf8(data) {
        for text in [SEGWIT, TAPROOT] {
            if let Ok(address) = parse_address(text, Network::Mainnet) {
                let _ = verify_bip322(&address, "fuzz", proof, ProofFormat::Simple);
                let _ = verify_bip322(&address, "fuzz", proof, ProofFormat::Full);
            }
        }
    }
});
