//! BIP-39 mnemonic parsing and seed derivation
//!
//! Mnemonics are English-only. Seeds are held in a [`LockedBuffer`] so they are
//! zeroized (and unlocked) as soon as the caller drops them.

use std::fmt;

use bip39::{Language, Mnemonic};
use thiserror::Error;
use zeroize::Zeroize;

use crate::memory::LockedBuffer;

/// Length of a BIP-39 seed in bytes.
pub const SEED_LEN: usize = 64;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
}

/// Options controlling mnemonic validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MnemonicOptions {
    /// Reject mnemonics whose embedded checksum does not match the entropy.
    pub verify_checksum: bool,
}

impl Default for MnemonicOptions {
    fn default() -> Self {
        Self {
            verify_checksum: true,
        }
    }
}

impl MnemonicOptions {
    /// Accept any sequence of wordlist words with a valid word count.
    pub fn skip_checksum() -> Self {
        Self {
            verify_checksum: false,
        }
    }
}

/// A 64-byte BIP-39 seed in locked, zero-on-drop memory.
pub struct Seed(LockedBuffer<SEED_LEN>);

impl Seed {
    /// Copy raw seed bytes into locked memory.
    pub fn from_bytes(bytes: &[u8; SEED_LEN]) -> Self {
        Seed(LockedBuffer::from_array(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        self.0.as_array()
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(<redacted>)")
    }
}

/// Generate a new English mnemonic with `word_count` words (12, 15, 18, 21 or 24).
pub fn generate_mnemonic(word_count: usize) -> Result<Mnemonic, SeedError> {
    Mnemonic::generate_in(Language::English, word_count)
        .map_err(|e| SeedError::InvalidMnemonic(e.to_string()))
}

/// Parse an English mnemonic, validating the wordlist and the checksum.
pub fn parse_mnemonic(words: &str) -> Result<Mnemonic, SeedError> {
    parse_mnemonic_with(words, MnemonicOptions::default())
}

/// Parse an English mnemonic with explicit validation options.
///
/// Word count and wordlist membership are always checked.
pub fn parse_mnemonic_with(words: &str, options: MnemonicOptions) -> Result<Mnemonic, SeedError> {
    let result = if options.verify_checksum {
        Mnemonic::parse_in(Language::English, words)
    } else {
        let mut normalized = words.split_whitespace().collect::<Vec<_>>().join(" ");
        let parsed =
            Mnemonic::parse_in_normalized_without_checksum_check(Language::English, &normalized);
        normalized.zeroize();
        parsed
    };

    result.map_err(|e| SeedError::InvalidMnemonic(describe_bip39_error(words, e)))
}

/// Derive the 512-bit seed from a mnemonic and optional passphrase.
pub fn mnemonic_to_seed(mnemonic: &Mnemonic, passphrase: &str) -> Seed {
    let mut raw = mnemonic.to_seed(passphrase);
    let seed = Seed::from_bytes(&raw);
    raw.zeroize();
    seed
}

// Error messages name word positions, never the words themselves.
fn describe_bip39_error(words: &str, err: bip39::Error) -> String {
    match err {
        bip39::Error::UnknownWord(i) => format!(
            "word {} of {} is not in the English wordlist",
            i + 1,
            words.split_whitespace().count()
        ),
        other => other.to_string(),
    }
}
