//! Boundary enums shared by every ownproof crate.
//!
//! Each enum round-trips through `FromStr`/`Display` and serde using the same
//! lowercase spellings, so config files, CLIs and JSON all agree.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Bitcoin network an address or WIF is encoded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// BIP-44 coin type: 0 for mainnet, 1 for every test network.
    pub fn coin_type(self) -> u32 {
        match self {
            Network::Mainnet => 0,
            Network::Testnet => 1,
        }
    }

    pub fn to_bitcoin(self) -> bitcoin::Network {
        match self {
            Network::Mainnet => bitcoin::Network::Bitcoin,
            Network::Testnet => bitcoin::Network::Testnet,
        }
    }
}

impl From<Network> for bitcoin::Network {
    fn from(network: Network) -> Self {
        network.to_bitcoin()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        })
    }
}

impl FromStr for Network {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" | "main" => Ok(Network::Mainnet),
            "testnet" | "testnet3" | "test" => Ok(Network::Testnet),
            _ => Err(ParseEnumError::new("network", s)),
        }
    }
}

/// Output script template an address commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScriptType {
    /// Segwit v0 pay-to-witness-pubkey-hash (BIP-84).
    #[serde(rename = "segwit-v0")]
    SegwitV0,
    /// Segwit v1 pay-to-taproot, key path only (BIP-86).
    #[default]
    #[serde(rename = "taproot")]
    Taproot,
}

impl ScriptType {
    /// BIP-43 purpose level conventionally used for this script type.
    pub fn purpose(self) -> u32 {
        match self {
            ScriptType::SegwitV0 => 84,
            ScriptType::Taproot => 86,
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScriptType::SegwitV0 => "segwit-v0",
            ScriptType::Taproot => "taproot",
        })
    }
}

impl FromStr for ScriptType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "segwit-v0" | "p2wpkh" => Ok(ScriptType::SegwitV0),
            "taproot" | "p2tr" => Ok(ScriptType::Taproot),
            _ => Err(ParseEnumError::new("script type", s)),
        }
    }
}

/// BIP-322 proof encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofFormat {
    /// Base64 of the consensus-encoded witness stack of `to_sign`.
    #[default]
    Simple,
    /// Base64 of the whole consensus-encoded, signed `to_sign` transaction.
    Full,
}

impl fmt::Display for ProofFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProofFormat::Simple => "simple",
            ProofFormat::Full => "full",
        })
    }
}

impl FromStr for ProofFormat {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(ProofFormat::Simple),
            "full" => Ok(ProofFormat::Full),
            _ => Err(ParseEnumError::new("proof format", s)),
        }
    }
}
