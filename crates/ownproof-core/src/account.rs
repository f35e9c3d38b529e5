//! Public summary of a derived signing key.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::{encode_address, AddressError};
use crate::keys::{derive_key, DerivationPath, KeyError, KeyPair};
use crate::types::{Network, ScriptType};

#[derive(Error, Debug)]
pub enum AccountError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Everything about a derived key that is safe to print or store.
///
/// Holds no secret material. Serializes to JSON as
/// `{"path": ..., "script_type": ..., "network": ..., "address": ..., "public_key": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAccount {
    pub path: String,
    pub script_type: ScriptType,
    pub network: Network,
    pub address: String,
    /// Compressed SEC1 public key, hex.
    pub public_key: String,
}

impl DerivedAccount {
    /// Summarize an already-derived key pair.
    pub fn describe(
        key: &KeyPair,
        path: &DerivationPath,
        network: Network,
        script_type: ScriptType,
    ) -> Result<Self, AccountError> {
        let address = encode_address(&key.public_key(), network, script_type)?;
        Ok(DerivedAccount {
            path: path.to_string(),
            script_type,
            network,
            address: address.to_string(),
            public_key: key.public_key().to_string(),
        })
    }
}

/// Derive the key at `path` and return it with its public summary.
pub fn derive_account(
    mnemonic: &str,
    passphrase: &str,
    path: &DerivationPath,
    network: Network,
    script_type: ScriptType,
) -> Result<(KeyPair, DerivedAccount), AccountError> {
    let key = derive_key(mnemonic, passphrase, path)?;
    let account = DerivedAccount::describe(&key, path, network, script_type)?;
    Ok((key, account))
}
