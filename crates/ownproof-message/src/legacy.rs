//! "Bitcoin Signed Message" ECDSA signatures
//!
//! Digest: `SHA256d(0x18 || "Bitcoin Signed Message:\n" || varint(len) || message)`.
//! Signatures are deterministic (RFC 6979), low-S and DER encoded. There is no
//! public key recovery: the verifier must already know the key.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::secp256k1::{ecdsa, Message, PublicKey, Secp256k1};
use bitcoin::sign_message;
use log::debug;
use ownproof_core::KeyPair;

use crate::types::LegacyError;

/// Prefix committed to by every signed message, length byte included.
pub const MESSAGE_MAGIC: &[u8] = b"\x18Bitcoin Signed Message:\n";

/// Double-SHA256 digest of the prefixed message.
pub fn signed_message_digest(message: &str) -> sha256d::Hash {
    sign_message::signed_msg_hash(message)
}

/// A DER-encoded ECDSA signature over a signed-message digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacySignature(ecdsa::Signature);

impl LegacySignature {
    pub fn from_der(der: &[u8]) -> Result<Self, LegacyError> {
        ecdsa::Signature::from_der(der)
            .map(LegacySignature)
            .map_err(|e| LegacyError::InvalidSignature(e.to_string()))
    }

    pub fn from_hex(s: &str) -> Result<Self, LegacyError> {
        let der = hex::decode(s.trim()).map_err(|e| LegacyError::InvalidEncoding(e.to_string()))?;
        Self::from_der(&der)
    }

    pub fn from_base64(s: &str) -> Result<Self, LegacyError> {
        let der = BASE64
            .decode(s.trim())
            .map_err(|e| LegacyError::InvalidEncoding(e.to_string()))?;
        Self::from_der(&der)
    }

    pub fn to_der(&self) -> Vec<u8> {
        self.0.serialize_der().to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_der())
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_der())
    }

    pub fn as_ecdsa(&self) -> &ecdsa::Signature {
        &self.0
    }
}

/// Sign `message` with `key`. Same key and message always give the same bytes.
pub fn sign_legacy(message: &str, key: &KeyPair) -> LegacySignature {
    let secp = Secp256k1::signing_only();
    let digest = signed_message_digest(message);
    let msg = Message::from_digest(digest.to_byte_array());
    debug!("signing legacy message digest {}", digest);
    LegacySignature(key.with_secret_key(|sk| secp.sign_ecdsa(&msg, sk)))
}

/// Check `signature` over `message` against `public_key`.
///
/// High-S signatures are rejected, matching what [`sign_legacy`] produces.
pub fn verify_legacy(message: &str, signature: &LegacySignature, public_key: &PublicKey) -> bool {
    let secp = Secp256k1::verification_only();
    let digest = signed_message_digest(message);
    let msg = Message::from_digest(digest.to_byte_array());
    secp.verify_ecdsa(&msg, &signature.0, public_key).is_ok()
}
