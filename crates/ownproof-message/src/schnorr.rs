//! Raw BIP-340 Schnorr ownership signatures
//!
//! The signature covers `SHA256(message)` and is checked against the untweaked
//! x-only key, the same key that serves as the taproot internal key. Unlike a
//! BIP-322 proof there is no virtual transaction, so the verifier must already
//! know the key.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bitcoin::hashes::{sha256, Hash};
use bitcoin::secp256k1::{schnorr, Keypair, Message, Secp256k1, XOnlyPublicKey};
use log::debug;
use ownproof_core::KeyPair;

use crate::types::LegacyError;

/// Single SHA256 of the raw message bytes.
pub fn schnorr_message_digest(message: &str) -> sha256::Hash {
    sha256::Hash::hash(message.as_bytes())
}

/// A 64-byte BIP-340 signature over [`schnorr_message_digest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchnorrMessageSignature(schnorr::Signature);

impl SchnorrMessageSignature {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LegacyError> {
        schnorr::Signature::from_slice(bytes)
            .map(SchnorrMessageSignature)
            .map_err(|e| LegacyError::InvalidSignature(e.to_string()))
    }

    pub fn from_hex(s: &str) -> Result<Self, LegacyError> {
        let bytes = hex::decode(s.trim()).map_err(|e| LegacyError::InvalidEncoding(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn from_base64(s: &str) -> Result<Self, LegacyError> {
        let bytes = BASE64
            .decode(s.trim())
            .map_err(|e| LegacyError::InvalidEncoding(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.serialize()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }
}

/// Sign `message` with the untweaked key. No auxiliary randomness, so the
/// same key and message always give the same bytes.
pub fn sign_schnorr_message(message: &str, key: &KeyPair) -> SchnorrMessageSignature {
    let secp = Secp256k1::signing_only();
    let digest = schnorr_message_digest(message);
    let msg = Message::from_digest(digest.to_byte_array());
    debug!("signing schnorr message digest {}", digest);

    let mut keypair = key.with_secret_key(|sk| Keypair::from_secret_key(&secp, sk));
    let signature = secp.sign_schnorr_no_aux_rand(&msg, &keypair);
    keypair.non_secure_erase();
    SchnorrMessageSignature(signature)
}

/// Check `signature` over `message` against the x-only `public_key`.
pub fn verify_schnorr_message(
    message: &str,
    signature: &SchnorrMessageSignature,
    public_key: &XOnlyPublicKey,
) -> bool {
    let secp = Secp256k1::verification_only();
    let msg = Message::from_digest(schnorr_message_digest(message).to_byte_array());
    secp.verify_schnorr(&signature.0, &msg, public_key).is_ok()
}
