//! Error and proof types shared by the signers and verifiers.

use std::fmt;

use ownproof_core::{AddressError, ProofFormat};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Bip322Error {
    #[error("Unsupported script type: {0}")]
    UnsupportedScriptType(String),
    #[error("Key does not control address {0}")]
    KeyAddressMismatch(String),
    #[error("Malformed proof: {0}")]
    MalformedProof(String),
    #[error("Signature verification failed")]
    SignatureVerificationFailed,
    #[error("Sighash computation failed: {0}")]
    Sighash(String),
    #[error(transparent)]
    Address(AddressError),
}

impl From<AddressError> for Bip322Error {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::UnsupportedScriptType(kind) => Bip322Error::UnsupportedScriptType(kind),
            other => Bip322Error::Address(other),
        }
    }
}

#[derive(Error, Debug)]
pub enum LegacyError {
    #[error("Invalid signature encoding: {0}")]
    InvalidEncoding(String),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
}

/// A base64 BIP-322 proof together with the format it was encoded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    format: ProofFormat,
    encoded: String,
}

impl Proof {
    pub fn new(format: ProofFormat, encoded: impl Into<String>) -> Self {
        Proof {
            format,
            encoded: encoded.into(),
        }
    }

    pub fn format(&self) -> ProofFormat {
        self.format
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl AsRef<str> for Proof {
    fn as_ref(&self) -> &str {
        &self.encoded
    }
}
