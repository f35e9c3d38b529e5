//! BIP-322 proof generation for single-key P2WPKH and P2TR addresses.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bitcoin::consensus::encode::serialize;
use bitcoin::hashes::Hash;
use bitcoin::key::TapTweak;
use bitcoin::secp256k1::{Keypair, Message, Secp256k1};
use bitcoin::sighash::{Prevouts, SighashCache};
use bitcoin::{ecdsa, taproot, Address, EcdsaSighashType, TapSighashType, Transaction, Witness};
use log::debug;
use ownproof_core::{script_pubkey_for, KeyPair, ProofFormat, ScriptType};

use crate::bip322::{to_sign, to_spend};
use crate::types::{Bip322Error, Proof};

/// Sign `message` for `address` with `key`.
///
/// The key must own the address under its script type; a P2WPKH address
/// needs the key's own pubkey hash and a P2TR address the BIP-86 tweak of
/// the key.
pub fn sign_bip322(
    key: &KeyPair,
    address: &Address,
    message: &str,
    format: ProofFormat,
) -> Result<Proof, Bip322Error> {
    let script_type = ScriptType::of_address(address)?;
    let script_pubkey = address.script_pubkey();
    if script_pubkey_for(&key.public_key(), script_type)? != script_pubkey {
        return Err(Bip322Error::KeyAddressMismatch(address.to_string()));
    }

    let to_spend = to_spend(&script_pubkey, message.as_bytes());
    let mut to_sign = to_sign(&to_spend);

    let witness = match script_type {
        ScriptType::SegwitV0 => sign_p2wpkh(key, &to_spend, &to_sign)?,
        ScriptType::Taproot => sign_p2tr(key, &to_spend, &to_sign)?,
    };
    to_sign.input[0].witness = witness;
    debug!(
        "signed BIP-322 {} proof for {} address, to_sign {}",
        format,
        script_type,
        to_sign.compute_txid()
    );

    let encoded = match format {
        ProofFormat::Simple => BASE64.encode(serialize(&to_sign.input[0].witness)),
        ProofFormat::Full => BASE64.encode(serialize(&to_sign)),
    };
    Ok(Proof::new(format, encoded))
}

fn sign_p2wpkh(
    key: &KeyPair,
    to_spend: &Transaction,
    to_sign: &Transaction,
) -> Result<Witness, Bip322Error> {
    let secp = Secp256k1::signing_only();
    let spent = &to_spend.output[0];

    let sighash = SighashCache::new(to_sign)
        .p2wpkh_signature_hash(0, &spent.script_pubkey, spent.value, EcdsaSighashType::All)
        .map_err(|e| Bip322Error::Sighash(e.to_string()))?;
    let msg = Message::from_digest(sighash.to_byte_array());

    let signature = ecdsa::Signature::sighash_all(key.with_secret_key(|sk| secp.sign_ecdsa(&msg, sk)));
    Ok(Witness::p2wpkh(&signature, &key.public_key()))
}

fn sign_p2tr(
    key: &KeyPair,
    to_spend: &Transaction,
    to_sign: &Transaction,
) -> Result<Witness, Bip322Error> {
    let secp = Secp256k1::new();

    let sighash = SighashCache::new(to_sign)
        .taproot_key_spend_signature_hash(
            0,
            &Prevouts::All(&to_spend.output),
            TapSighashType::Default,
        )
        .map_err(|e| Bip322Error::Sighash(e.to_string()))?;
    let msg = Message::from_digest(sighash.to_byte_array());

    let mut untweaked = key.with_secret_key(|sk| Keypair::from_secret_key(&secp, sk));
    let mut tweaked = untweaked.tap_tweak(&secp, None).to_keypair();
    untweaked.non_secure_erase();
    let signature = secp.sign_schnorr_no_aux_rand(&msg, &tweaked);
    tweaked.non_secure_erase();

    let signature = taproot::Signature {
        signature,
        sighash_type: TapSighashType::Default,
    };
    let mut witness = Witness::new();
    witness.push(signature.to_vec());
    Ok(witness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ownproof_core::{derive_key, encode_address, DerivationPath, Network, BIP86_PATH};

    const VECTOR_WIF: &str = "L3VFeEujGtevx9w18HD1fhRbCH67Az2dpCymeRE1SoPK6XQtaN2k";
    const VECTOR_ADDRESS: &str = "bc1q9vza2e8x573nczrlzms0wvx3gsqjx7vavgkx0l";

    fn vector_address() -> Address {
        ownproof_core::parse_address(VECTOR_ADDRESS, Network::Mainnet).unwrap()
    }

    #[test]
    fn test_p2wpkh_simple_proofs_are_deterministic() {
        let key = KeyPair::from_wif(VECTOR_WIF).unwrap();
        let address = vector_address();

        let empty = sign_bip322(&key, &address, "", ProofFormat::Simple).unwrap();
        assert_eq!(
            empty.as_str(),
            "AkgwRQIhAPkJ1Q4oYS0htvyuSFHLxRQpFAY56b70UvE7Dxazen0ZAiAtZfFz1S6T6I23MWI2lK/pcNTWncuyL8UL+oMdydVgzAEhAsfxIAMZZEKUPYWI4BruhAQjzFT8FSFSajuFwrDL1Yhy"
        );

        let hello = sign_bip322(&key, &address, "Hello World", ProofFormat::Simple).unwrap();
        assert_eq!(
            hello.as_str(),
            "AkgwRQIhAOzyynlqt93lOKJr+wmmxIens//zPzl9tqIOua93wO6MAiBi5n5EyAcPScOjf1lAqIUIQtr3zKNeavYabHyR8eGhowEhAsfxIAMZZEKUPYWI4BruhAQjzFT8FSFSajuFwrDL1Yhy"
        );
        assert_eq!(
            hello,
            sign_bip322(&key, &address, "Hello World", ProofFormat::Simple).unwrap()
        );
    }

    #[test]
    fn test_taproot_witness_is_single_64_byte_signature() {
        let key = derive_key(
            "example crash candy gauge soccer artefact dance used goose solid tray trap",
            "",
            &DerivationPath::parse(BIP86_PATH).unwrap(),
        )
        .unwrap();
        let address = encode_address(&key.public_key(), Network::Mainnet, ScriptType::Taproot).unwrap();

        let proof = sign_bip322(&key, &address, "Hello World", ProofFormat::Simple).unwrap();
        let bytes = BASE64.decode(proof.as_str()).unwrap();
        // count, push length, 64-byte signature
        assert_eq!(bytes.len(), 66);
        assert_eq!(&bytes[..2], &[0x01, 0x40]);

        let again = sign_bip322(&key, &address, "Hello World", ProofFormat::Simple).unwrap();
        assert_eq!(proof, again);
    }

    #[test]
    fn test_taproot_signature_uses_tweaked_key() {
        let key = KeyPair::from_wif(VECTOR_WIF).unwrap();
        let address = encode_address(&key.public_key(), Network::Mainnet, ScriptType::Taproot).unwrap();
        let proof = sign_bip322(&key, &address, "Hello World", ProofFormat::Simple).unwrap();
        let witness: Witness =
            bitcoin::consensus::deserialize(&BASE64.decode(proof.as_str()).unwrap()).unwrap();
        let signature = taproot::Signature::from_slice(witness.nth(0).unwrap()).unwrap();

        let to_spend = to_spend(&address.script_pubkey(), b"Hello World");
        let to_sign = to_sign(&to_spend);
        let sighash = SighashCache::new(&to_sign)
            .taproot_key_spend_signature_hash(0, &Prevouts::All(&to_spend.output), TapSighashType::Default)
            .unwrap();
        let msg = Message::from_digest(sighash.to_byte_array());

        let secp = Secp256k1::verification_only();
        let (output_key, _) = key.x_only_public_key().tap_tweak(&secp, None);
        assert!(secp
            .verify_schnorr(&signature.signature, &msg, &output_key.to_x_only_public_key())
            .is_ok());
        assert!(secp
            .verify_schnorr(&signature.signature, &msg, &key.x_only_public_key())
            .is_err());
    }

    #[test]
    fn test_full_proof_is_signed_to_sign() {
        let key = KeyPair::from_wif(VECTOR_WIF).unwrap();
        let address = vector_address();

        let proof = sign_bip322(&key, &address, "Hello World", ProofFormat::Full).unwrap();
        assert_eq!(proof.format(), ProofFormat::Full);

        let tx: Transaction =
            bitcoin::consensus::deserialize(&BASE64.decode(proof.as_str()).unwrap()).unwrap();
        assert_eq!(
            tx.compute_txid().to_string(),
            "88737ae86f2077145f93cc4b153ae9a1cb8d56afa511988c149c5c8c9d93bddf"
        );
        assert_eq!(tx.input[0].witness.len(), 2);
    }

    #[test]
    fn test_key_address_mismatch() {
        let key = KeyPair::from_secret_bytes(&[0x22; 32]).unwrap();
        let err = sign_bip322(&key, &vector_address(), "hi", ProofFormat::Simple).unwrap_err();
        assert!(matches!(err, Bip322Error::KeyAddressMismatch(_)));
    }

    #[test]
    fn test_unsupported_address_type() {
        let key = KeyPair::from_wif(VECTOR_WIF).unwrap();
        let p2pkh =
            ownproof_core::parse_address("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", Network::Mainnet)
                .unwrap();
        assert!(matches!(
            sign_bip322(&key, &p2pkh, "hi", ProofFormat::Simple),
            Err(Bip322Error::UnsupportedScriptType(_))
        ));
    }
}
