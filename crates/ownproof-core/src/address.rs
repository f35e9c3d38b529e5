//! Segwit address encoding
//!
//! Only the two single-key output types are supported:
//! - P2WPKH (segwit v0, bech32): `HASH160(pubkey)` as a 20-byte program
//! - P2TR key path (segwit v1, bech32m): the BIP-341 tweaked x-only output key

use bitcoin::address::{Address, AddressType, NetworkUnchecked};
use bitcoin::hashes::{ripemd160, sha256, Hash};
use bitcoin::key::TweakedPublicKey;
use bitcoin::secp256k1::{PublicKey, Secp256k1, XOnlyPublicKey};
use bitcoin::taproot::{TapNodeHash, TapTweakHash};
use bitcoin::{Script, ScriptBuf, WitnessProgram, WitnessVersion};
use log::debug;
use thiserror::Error;

use crate::types::{Network, ScriptType};

#[derive(Error, Debug)]
pub enum AddressError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Address is not valid for {expected}")]
    NetworkMismatch { expected: Network },
    #[error("Unsupported script type: {0}")]
    UnsupportedScriptType(String),
    #[error("Invalid witness program: {0}")]
    InvalidProgram(String),
}

/// `RIPEMD160(SHA256(pubkey))` over the 33-byte compressed encoding.
pub fn pubkey_hash(public_key: &PublicKey) -> [u8; 20] {
    let sha = sha256::Hash::hash(&public_key.serialize());
    ripemd160::Hash::hash(sha.as_byte_array()).to_byte_array()
}

/// Encode a compressed public key as a native segwit v0 address.
pub fn encode_p2wpkh(public_key: &PublicKey, network: Network) -> Result<Address, AddressError> {
    let program = WitnessProgram::new(WitnessVersion::V0, &pubkey_hash(public_key))
        .map_err(|e| AddressError::InvalidProgram(e.to_string()))?;
    Ok(Address::from_witness_program(program, network.to_bitcoin()))
}

/// Apply the BIP-341 tweak to an internal key.
///
/// `Q = P + H_TapTweak(P || merkle_root)·G`, where the merkle root is omitted
/// for key-path-only outputs.
pub fn taproot_output_key(
    internal_key: &XOnlyPublicKey,
    merkle_root: Option<TapNodeHash>,
) -> Result<TweakedPublicKey, AddressError> {
    let secp = Secp256k1::verification_only();
    let tweak = TapTweakHash::from_key_and_tweak(*internal_key, merkle_root).to_scalar();
    let (output_key, _parity) = internal_key
        .add_tweak(&secp, &tweak)
        .map_err(|e| AddressError::InvalidProgram(e.to_string()))?;
    Ok(TweakedPublicKey::dangerous_assume_tweaked(output_key))
}

/// Encode an internal key as a taproot address.
pub fn encode_p2tr(
    internal_key: &XOnlyPublicKey,
    network: Network,
    merkle_root: Option<TapNodeHash>,
) -> Result<Address, AddressError> {
    let output_key = taproot_output_key(internal_key, merkle_root)?;
    Ok(Address::p2tr_tweaked(output_key, network.to_bitcoin()))
}

/// Encode `public_key` for `script_type` on `network`.
pub fn encode_address(
    public_key: &PublicKey,
    network: Network,
    script_type: ScriptType,
) -> Result<Address, AddressError> {
    let address = match script_type {
        ScriptType::SegwitV0 => encode_p2wpkh(public_key, network)?,
        ScriptType::Taproot => {
            let (internal_key, _parity) = public_key.x_only_public_key();
            encode_p2tr(&internal_key, network, None)?
        }
    };
    debug!("encoded {} address for {}", script_type, network);
    Ok(address)
}

/// The scriptPubKey a single key locks to under `script_type`.
pub fn script_pubkey_for(
    public_key: &PublicKey,
    script_type: ScriptType,
) -> Result<ScriptBuf, AddressError> {
    Ok(encode_address(public_key, Network::Mainnet, script_type)?.script_pubkey())
}

/// Parse an address and require it to belong to `network`.
pub fn parse_address(text: &str, network: Network) -> Result<Address, AddressError> {
    let unchecked: Address<NetworkUnchecked> = text
        .trim()
        .parse()
        .map_err(|e: bitcoin::address::ParseError| AddressError::InvalidAddress(e.to_string()))?;
    if !unchecked.is_valid_for_network(network.to_bitcoin()) {
        return Err(AddressError::NetworkMismatch { expected: network });
    }
    Ok(unchecked.assume_checked())
}

impl ScriptType {
    /// Classify an address. Only P2WPKH and P2TR are accepted.
    pub fn of_address(address: &Address) -> Result<ScriptType, AddressError> {
        match address.address_type() {
            Some(AddressType::P2wpkh) => Ok(ScriptType::SegwitV0),
            Some(AddressType::P2tr) => Ok(ScriptType::Taproot),
            Some(other) => Err(AddressError::UnsupportedScriptType(other.to_string())),
            None => Err(AddressError::UnsupportedScriptType(
                "unknown witness program".to_string(),
            )),
        }
    }

    /// Classify a scriptPubKey.
    pub fn of_script(script: &Script) -> Result<ScriptType, AddressError> {
        if script.is_p2wpkh() {
            Ok(ScriptType::SegwitV0)
        } else if script.is_p2tr() {
            Ok(ScriptType::Taproot)
        } else if script.is_p2pkh() {
            Err(AddressError::UnsupportedScriptType("p2pkh".to_string()))
        } else if script.is_p2sh() {
            Err(AddressError::UnsupportedScriptType("p2sh".to_string()))
        } else if script.is_p2wsh() {
            Err(AddressError::UnsupportedScriptType("p2wsh".to_string()))
        } else {
            Err(AddressError::UnsupportedScriptType(
                "non-standard script".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{derive_key, DerivationPath, KeyPair, BIP84_PATH, BIP86_PATH};
    use bitcoin::key::TapTweak;
    use bitcoin::CompressedPublicKey;

    const EXAMPLE_MNEMONIC: &str =
        "example crash candy gauge soccer artefact dance used goose solid tray trap";
    const ABANDON_ABOUT: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn key_at(mnemonic: &str, path: &str) -> KeyPair {
        derive_key(mnemonic, "", &DerivationPath::parse(path).unwrap()).unwrap()
    }

    #[test]
    fn test_example_taproot_address() {
        let key = key_at(EXAMPLE_MNEMONIC, BIP86_PATH);
        let mainnet = encode_address(&key.public_key(), Network::Mainnet, ScriptType::Taproot);
        let testnet = encode_address(&key.public_key(), Network::Testnet, ScriptType::Taproot);
        assert_eq!(
            mainnet.unwrap().to_string(),
            "bc1p78g3ksuml8syeq02t38u0dept6skr92chz70kkzs78y5n5kqtnhq4hs76h"
        );
        assert_eq!(
            testnet.unwrap().to_string(),
            "tb1p78g3ksuml8syeq02t38u0dept6skr92chz70kkzs78y5n5kqtnhqzlx3qc"
        );
    }

    #[test]
    fn test_example_segwit_address() {
        let key = key_at(EXAMPLE_MNEMONIC, BIP84_PATH);
        assert_eq!(
            encode_p2wpkh(&key.public_key(), Network::Mainnet)
                .unwrap()
                .to_string(),
            "bc1qalmses6ceyfq7waxgtgkrz3wcxzdel6sz49d8s"
        );
        assert_eq!(
            encode_p2wpkh(&key.public_key(), Network::Testnet)
                .unwrap()
                .to_string(),
            "tb1qalmses6ceyfq7waxgtgkrz3wcxzdel6sgn77ur"
        );
    }

    /// Script type follows the caller, not the path purpose.
    #[test]
    fn test_script_type_is_independent_of_path() {
        let bip86_key = key_at(EXAMPLE_MNEMONIC, BIP86_PATH);
        let bip84_key = key_at(EXAMPLE_MNEMONIC, BIP84_PATH);
        assert_eq!(
            encode_address(&bip86_key.public_key(), Network::Mainnet, ScriptType::SegwitV0)
                .unwrap()
                .to_string(),
            "bc1quam8hl7vmxqucmvw9495w896aval4enxp5u2vq"
        );
        assert_eq!(
            encode_address(&bip84_key.public_key(), Network::Mainnet, ScriptType::Taproot)
                .unwrap()
                .to_string(),
            "bc1pqf99txttkpaxdk39nt2ka8rmxuv7csxf4nuuv8v0l59yta8wn6cswhj2fn"
        );
    }

    /// BIP-84 and BIP-86 reference vectors.
    #[test]
    fn test_bip84_bip86_vectors() {
        let segwit = key_at(ABANDON_ABOUT, BIP84_PATH);
        assert_eq!(
            encode_p2wpkh(&segwit.public_key(), Network::Mainnet)
                .unwrap()
                .to_string(),
            "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"
        );

        let taproot = key_at(ABANDON_ABOUT, BIP86_PATH);
        assert_eq!(
            encode_p2tr(&taproot.x_only_public_key(), Network::Mainnet, None)
                .unwrap()
                .to_string(),
            "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr"
        );
    }

    #[test]
    fn test_pubkey_hash_matches_hash160() {
        let key = key_at(EXAMPLE_MNEMONIC, BIP84_PATH);
        let expected = CompressedPublicKey(key.public_key()).wpubkey_hash();
        assert_eq!(pubkey_hash(&key.public_key()), expected.to_byte_array());
    }

    #[test]
    fn test_output_key_matches_tap_tweak() {
        let secp = Secp256k1::new();
        let key = key_at(ABANDON_ABOUT, BIP86_PATH);
        let internal = key.x_only_public_key();
        let (expected, _) = internal.tap_tweak(&secp, None);
        assert_eq!(taproot_output_key(&internal, None).unwrap(), expected);

        let root = TapNodeHash::from_byte_array([7u8; 32]);
        let (expected, _) = internal.tap_tweak(&secp, Some(root));
        assert_eq!(taproot_output_key(&internal, Some(root)).unwrap(), expected);
    }

    #[test]
    fn test_parse_is_inverse_of_encode() {
        let key = key_at(EXAMPLE_MNEMONIC, BIP86_PATH);
        for network in [Network::Mainnet, Network::Testnet] {
            for script_type in [ScriptType::SegwitV0, ScriptType::Taproot] {
                let encoded = encode_address(&key.public_key(), network, script_type).unwrap();
                let parsed = parse_address(&encoded.to_string(), network).unwrap();
                assert_eq!(parsed, encoded);
                assert_eq!(ScriptType::of_address(&parsed).unwrap(), script_type);
                assert_eq!(
                    ScriptType::of_script(&parsed.script_pubkey()).unwrap(),
                    script_type
                );
            }
        }
    }

    #[test]
    fn test_parse_rejects_wrong_network() {
        let err = parse_address(
            "bc1qalmses6ceyfq7waxgtgkrz3wcxzdel6sz49d8s",
            Network::Testnet,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AddressError::NetworkMismatch {
                expected: Network::Testnet
            }
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in [
            "",
            "bc1qalmses6ceyfq7waxgtgkrz3wcxzdel6sz49d8t",
            "not an address",
        ] {
            assert!(matches!(
                parse_address(bad, Network::Mainnet),
                Err(AddressError::InvalidAddress(_))
            ));
        }
    }

    #[test]
    fn test_unsupported_address_types() {
        for text in [
            "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2",
            "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy",
            "bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3",
        ] {
            let address = parse_address(text, Network::Mainnet).unwrap();
            assert!(matches!(
                ScriptType::of_address(&address),
                Err(AddressError::UnsupportedScriptType(_))
            ));
            assert!(matches!(
                ScriptType::of_script(&address.script_pubkey()),
                Err(AddressError::UnsupportedScriptType(_))
            ));
        }
    }

    #[test]
    fn test_script_pubkey_for_is_network_independent() {
        let key = key_at(EXAMPLE_MNEMONIC, BIP84_PATH);
        let testnet = encode_p2wpkh(&key.public_key(), Network::Testnet).unwrap();
        assert_eq!(
            script_pubkey_for(&key.public_key(), ScriptType::SegwitV0).unwrap(),
            testnet.script_pubkey()
        );
    }
}
