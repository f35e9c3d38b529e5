//! Wallet and signing configuration, parsed from TOML plus environment overrides.
//!
//! Priority: environment variables > config file > defaults.
//!
//! The config never holds secrets. Mnemonics, passphrases and WIFs are always
//! passed to the library as call parameters.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keys::{DerivationPath, KeyError, HARDENED_OFFSET};
use crate::seed::MnemonicOptions;
use crate::types::{Network, ProofFormat, ScriptType};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value {value:?} for {var}")]
    InvalidOverride { var: &'static str, value: String },
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wallet: WalletSection,

    #[serde(default)]
    pub signing: SigningSection,
}

/// Which key and address to use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSection {
    #[serde(default)]
    pub network: Network,

    #[serde(default)]
    pub script_type: ScriptType,

    /// BIP-44 account (hardened)
    #[serde(default)]
    pub account: u32,

    /// 0 = receive, 1 = change
    #[serde(default)]
    pub change: u32,

    #[serde(default)]
    pub address_index: u32,
}

impl Default for WalletSection {
    fn default() -> Self {
        Self {
            network: Network::default(),
            script_type: ScriptType::default(),
            account: 0,
            change: 0,
            address_index: 0,
        }
    }
}

/// How proofs are produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningSection {
    #[serde(default)]
    pub proof_format: ProofFormat,

    #[serde(default = "default_verify_checksum")]
    pub verify_mnemonic_checksum: bool,
}

impl Default for SigningSection {
    fn default() -> Self {
        Self {
            proof_format: ProofFormat::default(),
            verify_mnemonic_checksum: default_verify_checksum(),
        }
    }
}

fn default_verify_checksum() -> bool {
    true
}

// ============================================================================
// Loading & environment override
// ============================================================================

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `OWNPROOF_NETWORK`
    /// - `OWNPROOF_SCRIPT_TYPE`
    /// - `OWNPROOF_PROOF_FORMAT`
    /// - `OWNPROOF_ACCOUNT`
    /// - `OWNPROOF_ADDRESS_INDEX`
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary lookup, e.g. a map in tests.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(v) = lookup("OWNPROOF_NETWORK") {
            self.wallet.network = parse_override("OWNPROOF_NETWORK", v)?;
        }
        if let Some(v) = lookup("OWNPROOF_SCRIPT_TYPE") {
            self.wallet.script_type = parse_override("OWNPROOF_SCRIPT_TYPE", v)?;
        }
        if let Some(v) = lookup("OWNPROOF_PROOF_FORMAT") {
            self.signing.proof_format = parse_override("OWNPROOF_PROOF_FORMAT", v)?;
        }
        if let Some(v) = lookup("OWNPROOF_ACCOUNT") {
            self.wallet.account = parse_override("OWNPROOF_ACCOUNT", v)?;
        }
        if let Some(v) = lookup("OWNPROOF_ADDRESS_INDEX") {
            self.wallet.address_index = parse_override("OWNPROOF_ADDRESS_INDEX", v)?;
        }
        Ok(())
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.wallet.account < HARDENED_OFFSET,
            "wallet.account must be below 2^31",
        )?;
        ensure(
            self.wallet.change <= 1,
            "wallet.change must be 0 (receive) or 1 (change)",
        )?;
        ensure(
            self.wallet.address_index < HARDENED_OFFSET,
            "wallet.address_index must be below 2^31",
        )?;
        Ok(())
    }

    /// `m/purpose'/coin'/account'/change/index` for the configured wallet.
    pub fn derivation_path(&self) -> Result<DerivationPath, ConfigError> {
        Ok(DerivationPath::bip44(
            self.wallet.script_type.purpose(),
            self.wallet.network,
            self.wallet.account,
            self.wallet.change,
            self.wallet.address_index,
        )?)
    }

    pub fn mnemonic_options(&self) -> MnemonicOptions {
        MnemonicOptions {
            verify_checksum: self.signing.verify_mnemonic_checksum,
        }
    }
}

fn parse_override<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidOverride { var, value })
}

fn ensure(condition: bool, message: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
