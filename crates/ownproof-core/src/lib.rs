//! ownproof core
//!
//! Deterministic keys and addresses for proving wallet ownership.
//!
//! # Key Derivation
//!
//! From a single BIP-39 mnemonic:
//! - Segwit v0 keys via BIP-84: m/84'/0'/0'/0/0
//! - Taproot keys via BIP-86: m/86'/0'/0'/0/0
//!
//! # Secret Handling
//!
//! Seeds live in locked memory and key scalars are erased on drop. Nothing in
//! this crate logs or formats private key material; WIF export is an explicit
//! call to [`KeyPair::expose_wif`].

pub mod account;
pub mod address;
pub mod config;
pub mod keys;
pub mod memory;
pub mod seed;
pub mod types;

pub use account::{derive_account, AccountError, DerivedAccount};
pub use address::{
    encode_address, encode_p2tr, encode_p2wpkh, parse_address, pubkey_hash, script_pubkey_for,
    taproot_output_key, AddressError,
};
pub use config::{Config, ConfigError};
pub use keys::*;
pub use seed::*;
pub use types::{Network, ParseEnumError, ProofFormat, ScriptType};

pub use bip39::Mnemonic;
pub use bitcoin::Address;
