//! ownproof message signing
//!
//! Three ways to prove control of an address derived by `ownproof-core`:
//!
//! - [`legacy`]: the "Bitcoin Signed Message" ECDSA digest, verified against a
//!   known public key.
//! - [`schnorr`]: a raw BIP-340 signature over `SHA256(message)`, verified
//!   against the untweaked x-only key.
//! - [`bip322`]: generic signed messages. A proof is a witness (simple format)
//!   or a whole signed transaction (full format) spending a virtual output
//!   locked to the address, so anyone holding the address can verify it.
//!
//! ```no_run
//! use ownproof_core::{derive_key, encode_address, DerivationPath, Network, ProofFormat, ScriptType};
//! use ownproof_message::{sign_bip322, verify_bip322};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let path: DerivationPath = "m/86'/0'/0'/0/0".parse()?;
//! let key = derive_key("<mnemonic words>", "", &path)?;
//! let address = encode_address(&key.public_key(), Network::Mainnet, ScriptType::Taproot)?;
//!
//! let proof = sign_bip322(&key, &address, "I own this address", ProofFormat::Simple)?;
//! verify_bip322(&address, "I own this address", proof.as_str(), ProofFormat::Simple)?;
//! # Ok(())
//! # }
//! ```

pub mod bip322;
pub mod legacy;
pub mod schnorr;
pub mod sign;
pub mod types;
pub mod verify;

pub use bip322::{message_hash, tagged_hash, to_sign, to_spend};
pub use legacy::{sign_legacy, signed_message_digest, verify_legacy, LegacySignature};
pub use schnorr::{
    schnorr_message_digest, sign_schnorr_message, verify_schnorr_message, SchnorrMessageSignature,
};
pub use sign::sign_bip322;
pub use types::{Bip322Error, LegacyError, Proof};
pub use verify::{verify_bip322, verify_proof};
