//! Security-specific tests.
//!
//! These tests verify:
//! 1. Secret material never appears in Debug output or public summaries
//! 2. Parsers reject malformed input without panicking
//! 3. Proofs are bound to key, address, message and format
//! 4. Random keys round-trip through every signer

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ownproof_core::{
    derive_account, derive_key, encode_address, mnemonic_to_seed, parse_address, parse_mnemonic,
    DerivationPath, KeyPair, Network, ProofFormat, ScriptType,
};
use ownproof_message::{
    sign_bip322, sign_legacy, sign_schnorr_message, verify_bip322, verify_legacy,
    verify_schnorr_message, Bip322Error,
};
use rand::{Rng, RngCore};
use zeroize::Zeroize;

const EXAMPLE_MNEMONIC: &str =
    "example crash candy gauge soccer artefact dance used goose solid tray trap";

fn random_key() -> KeyPair {
    let mut rng = rand::thread_rng();
    loop {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        let key = KeyPair::from_secret_bytes(&bytes);
        bytes.zeroize();
        if let Ok(key) = key {
            return key;
        }
    }
}

// ============================================================================
// 1. Secret redaction
// ============================================================================

#[test]
fn test_debug_output_never_contains_secrets() {
    let path = DerivationPath::parse("m/86'/0'/0'/0/0").unwrap();
    let key = derive_key(EXAMPLE_MNEMONIC, "", &path).unwrap();
    let secret_hex = key.with_secret_key(|sk| hex::encode(sk.secret_bytes()));
    let wif = key.expose_wif(Network::Mainnet);

    let rendered = format!("{:?} {:#?}", key, key);
    assert!(!rendered.contains(&secret_hex));
    assert!(!rendered.contains(wif.as_str()));

    let mnemonic = parse_mnemonic(EXAMPLE_MNEMONIC).unwrap();
    let seed = mnemonic_to_seed(&mnemonic, "");
    let rendered = format!("{:?}", seed);
    assert!(!rendered.contains(&hex::encode(seed.as_bytes())));
}

#[test]
fn test_account_summary_has_no_secret() {
    let path = DerivationPath::parse("m/84'/0'/0'/0/0").unwrap();
    let (key, account) = derive_account(
        EXAMPLE_MNEMONIC,
        "",
        &path,
        Network::Mainnet,
        ScriptType::SegwitV0,
    )
    .unwrap();
    let json = serde_json::to_string(&account).unwrap();
    assert!(!json.contains(key.expose_wif(Network::Mainnet).as_str()));
    assert!(!json.contains("example crash"));
}

#[test]
fn test_mnemonic_errors_do_not_echo_words() {
    let err = parse_mnemonic("example crash candy gauge soccer artefact dance used goose solid tray zzzz")
        .unwrap_err()
        .to_string();
    assert!(!err.contains("example"));
    assert!(!err.contains("zzzz"));
}

// ============================================================================
// 2. Malformed input never panics
// ============================================================================

#[test]
fn test_random_proofs_are_rejected() {
    let mut rng = rand::thread_rng();
    let key = random_key();
    for script_type in [ScriptType::SegwitV0, ScriptType::Taproot] {
        let address = encode_address(&key.public_key(), Network::Mainnet, script_type).unwrap();
        for _ in 0..200 {
            let len = rng.gen_range(0..200);
            let mut junk = vec![0u8; len];
            rng.fill_bytes(&mut junk);
            let proof = BASE64.encode(&junk);
            for format in [ProofFormat::Simple, ProofFormat::Full] {
                assert!(verify_bip322(&address, "msg", &proof, format).is_err());
            }
        }
    }
}

#[test]
fn test_random_text_inputs_do_not_panic() {
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let len = rng.gen_range(0..80);
        let text: String = (0..len)
            .map(|_| rng.gen_range(0x20u8..0x7f) as char)
            .collect();
        let _ = parse_mnemonic(&text);
        let _ = DerivationPath::parse(&text);
        let _ = parse_address(&text, Network::Mainnet);
        let _ = KeyPair::from_wif(&text);
    }
}

#[test]
fn test_path_edge_cases() {
    let deep = format!("m{}", "/0".repeat(255));
    assert!(DerivationPath::parse(&deep).is_ok());
    let too_deep = format!("m{}", "/0".repeat(256));
    assert!(DerivationPath::parse(&too_deep).is_err());
    assert!(DerivationPath::parse("m/4294967295").is_err());
    assert!(DerivationPath::parse("m/0x10").is_err());
}

// ============================================================================
// 3. Proof binding
// ============================================================================

#[test]
fn test_proof_does_not_transfer_between_script_types() {
    let key = random_key();
    let segwit = encode_address(&key.public_key(), Network::Mainnet, ScriptType::SegwitV0).unwrap();
    let taproot = encode_address(&key.public_key(), Network::Mainnet, ScriptType::Taproot).unwrap();

    let proof = sign_bip322(&key, &segwit, "bound", ProofFormat::Simple).unwrap();
    assert!(matches!(
        verify_bip322(&taproot, "bound", proof.as_str(), ProofFormat::Simple),
        Err(Bip322Error::MalformedProof(_))
    ));
}

#[test]
fn test_cannot_sign_for_someone_elses_address() {
    let mine = random_key();
    let theirs = random_key();
    for script_type in [ScriptType::SegwitV0, ScriptType::Taproot] {
        let address = encode_address(&theirs.public_key(), Network::Mainnet, script_type).unwrap();
        assert!(matches!(
            sign_bip322(&mine, &address, "steal", ProofFormat::Simple),
            Err(Bip322Error::KeyAddressMismatch(_))
        ));
    }
}

#[test]
fn test_legacy_signature_bound_to_key() {
    let key = random_key();
    let other = random_key();
    let signature = sign_legacy("bound", &key);
    assert!(verify_legacy("bound", &signature, &key.public_key()));
    assert!(!verify_legacy("bound", &signature, &other.public_key()));
}

#[test]
fn test_schnorr_signature_bound_to_key() {
    let key = random_key();
    let other = random_key();
    let signature = sign_schnorr_message("bound", &key);
    assert!(verify_schnorr_message("bound", &signature, &key.x_only_public_key()));
    assert!(!verify_schnorr_message("bound", &signature, &other.x_only_public_key()));
}

// ============================================================================
// 4. Random keys
// ============================================================================

#[test]
fn test_random_keys_roundtrip() {
    for _ in 0..10 {
        let key = random_key();
        for script_type in [ScriptType::SegwitV0, ScriptType::Taproot] {
            let address = encode_address(&key.public_key(), Network::Testnet, script_type).unwrap();
            for format in [ProofFormat::Simple, ProofFormat::Full] {
                let proof = sign_bip322(&key, &address, "random", format).unwrap();
                verify_bip322(&address, "random", proof.as_str(), format).unwrap();
            }
        }

        let wif = key.expose_wif(Network::Testnet);
        let reimported = KeyPair::from_wif(&wif).unwrap();
        assert_eq!(reimported.public_key(), key.public_key());
    }
}
