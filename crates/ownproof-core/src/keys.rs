//! BIP-32 key derivation from a BIP-39 seed
//!
//! Wraps `bitcoin::bip32` with a stricter path parser, an extended key that may
//! be private or public, and a [`KeyPair`] whose secret scalar is erased on drop.
//!
//! Conventional paths:
//! - BIP-84 (segwit v0): `m/84'/0'/0'/0/0`
//! - BIP-86 (taproot):   `m/86'/0'/0'/0/0`

use std::fmt;
use std::str::FromStr;

use bitcoin::bip32::{self, ChildNumber, Fingerprint, Xpriv, Xpub};
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey, XOnlyPublicKey};
use bitcoin::{CompressedPublicKey, NetworkKind, PrivateKey};
use log::debug;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::seed::{mnemonic_to_seed, parse_mnemonic_with, MnemonicOptions, Seed, SeedError};
use crate::types::Network;

/// BIP-84 account path for mainnet native segwit keys.
pub const BIP84_PATH: &str = "m/84'/0'/0'/0/0";

/// BIP-86 account path for mainnet single-key taproot.
pub const BIP86_PATH: &str = "m/86'/0'/0'/0/0";

/// Offset added to an index to mark it hardened.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Extended keys serialize depth as a single byte.
const MAX_DEPTH: usize = 255;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error("Invalid derivation path: {0}")]
    InvalidDerivationPath(String),
    #[error("Child index {0} is outside the 31-bit range")]
    InvalidIndex(String),
    #[error("Hardened derivation at {0} requires a private key")]
    HardenedDerivationRequiresPrivateKey(ChildNumber),
    #[error("Extended key holds no private key")]
    MissingPrivateKey,
    #[error("Derivation failed: {0}")]
    DerivationFailed(String),
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Invalid WIF: {0}")]
    InvalidWif(String),
}

/// A BIP-32 derivation path such as `m/86'/0'/0'/0/0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DerivationPath(Vec<ChildNumber>);

impl DerivationPath {
    /// The empty path `m`.
    pub fn master() -> Self {
        DerivationPath(Vec::new())
    }

    /// Parse `m/a/b'/c` notation. `'`, `h` and `H` all mark a hardened step.
    pub fn parse(s: &str) -> Result<Self, KeyError> {
        let mut parts = s.trim().split('/');
        match parts.next() {
            Some("m") | Some("M") => {}
            _ => {
                return Err(KeyError::InvalidDerivationPath(format!(
                    "{s:?} must start with 'm'"
                )))
            }
        }

        let mut children = Vec::new();
        for part in parts {
            children.push(parse_component(s, part)?);
            if children.len() > MAX_DEPTH {
                return Err(KeyError::InvalidDerivationPath(format!(
                    "deeper than {MAX_DEPTH} levels"
                )));
            }
        }
        Ok(DerivationPath(children))
    }

    /// Build a path from `(index, hardened)` pairs.
    pub fn from_components<I>(components: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = (u32, bool)>,
    {
        let mut children = Vec::new();
        for (index, hardened) in components {
            children.push(child_number(index, hardened)?);
        }
        if children.len() > MAX_DEPTH {
            return Err(KeyError::InvalidDerivationPath(format!(
                "deeper than {MAX_DEPTH} levels"
            )));
        }
        Ok(DerivationPath(children))
    }

    /// BIP-44 style path `m/purpose'/coin'/account'/change/index`.
    pub fn bip44(
        purpose: u32,
        network: Network,
        account: u32,
        change: u32,
        index: u32,
    ) -> Result<Self, KeyError> {
        Self::from_components([
            (purpose, true),
            (network.coin_type(), true),
            (account, true),
            (change, false),
            (index, false),
        ])
    }

    pub fn components(&self) -> &[ChildNumber] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The BIP-43 purpose, if the first step is hardened.
    pub fn purpose(&self) -> Option<u32> {
        match self.0.first() {
            Some(ChildNumber::Hardened { index }) => Some(*index),
            _ => None,
        }
    }

    pub fn first_hardened(&self) -> Option<ChildNumber> {
        self.0.iter().copied().find(ChildNumber::is_hardened)
    }
}

fn parse_component(path: &str, part: &str) -> Result<ChildNumber, KeyError> {
    let (digits, hardened) = match part.strip_suffix(&['\'', 'h', 'H'][..]) {
        Some(digits) => (digits, true),
        None => (part, false),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeyError::InvalidDerivationPath(format!(
            "{path:?} has a malformed component {part:?}"
        )));
    }

    let index: u32 = match digits.parse() {
        Ok(index) => index,
        Err(_) => return Err(KeyError::InvalidIndex(digits.to_string())),
    };
    child_number(index, hardened)
}

fn child_number(index: u32, hardened: bool) -> Result<ChildNumber, KeyError> {
    if index >= HARDENED_OFFSET {
        return Err(KeyError::InvalidIndex(index.to_string()));
    }
    let child = if hardened {
        ChildNumber::from_hardened_idx(index)
    } else {
        ChildNumber::from_normal_idx(index)
    };
    child.map_err(|_| KeyError::InvalidIndex(index.to_string()))
}

impl FromStr for DerivationPath {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DerivationPath::parse(s)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for child in &self.0 {
            match child {
                ChildNumber::Hardened { index } => write!(f, "/{index}'")?,
                ChildNumber::Normal { index } => write!(f, "/{index}")?,
            }
        }
        Ok(())
    }
}

impl AsRef<[ChildNumber]> for DerivationPath {
    fn as_ref(&self) -> &[ChildNumber] {
        &self.0
    }
}

impl From<DerivationPath> for bip32::DerivationPath {
    fn from(path: DerivationPath) -> Self {
        bip32::DerivationPath::from(path.0)
    }
}

/// A BIP-32 extended key, private or public.
///
/// The private variant erases its scalar when dropped.
#[derive(Clone)]
pub enum ExtendedKey {
    Private(Xpriv),
    Public(Xpub),
}

/// Derive the master extended key from a seed.
///
/// HMAC-SHA512 yields an invalid master scalar with probability below 2^-127;
/// that case is reported instead of panicking.
pub fn derive_root(seed: &Seed) -> Result<ExtendedKey, KeyError> {
    Xpriv::new_master(NetworkKind::Main, seed.as_bytes())
        .map(ExtendedKey::Private)
        .map_err(|e| KeyError::DerivationFailed(e.to_string()))
}

/// Derive a child key of `root` along `path`.
pub fn derive_path(root: &ExtendedKey, path: &DerivationPath) -> Result<ExtendedKey, KeyError> {
    root.derive_path(path)
}

impl ExtendedKey {
    pub fn derive_path(&self, path: &DerivationPath) -> Result<ExtendedKey, KeyError> {
        let secp = Secp256k1::new();
        let derived = match self {
            ExtendedKey::Private(xpriv) => {
                let mut current = *xpriv;
                for child in path.components() {
                    let next = current.derive_priv(&secp, &[*child]).map_err(map_bip32_error);
                    current.private_key.non_secure_erase();
                    current = next?;
                }
                ExtendedKey::Private(current)
            }
            ExtendedKey::Public(xpub) => {
                if let Some(hardened) = path.first_hardened() {
                    return Err(KeyError::HardenedDerivationRequiresPrivateKey(hardened));
                }
                ExtendedKey::Public(xpub.derive_pub(&secp, path).map_err(map_bip32_error)?)
            }
        };
        debug!("derived {} key at {}", self.kind(), path);
        Ok(derived)
    }

    /// The public half of this key.
    pub fn neuter(&self) -> ExtendedKey {
        ExtendedKey::Public(self.xpub())
    }

    pub fn is_private(&self) -> bool {
        matches!(self, ExtendedKey::Private(_))
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            ExtendedKey::Private(xpriv) => xpriv.private_key.public_key(&Secp256k1::signing_only()),
            ExtendedKey::Public(xpub) => xpub.public_key,
        }
    }

    pub fn depth(&self) -> u8 {
        match self {
            ExtendedKey::Private(xpriv) => xpriv.depth,
            ExtendedKey::Public(xpub) => xpub.depth,
        }
    }

    pub fn parent_fingerprint(&self) -> Fingerprint {
        match self {
            ExtendedKey::Private(xpriv) => xpriv.parent_fingerprint,
            ExtendedKey::Public(xpub) => xpub.parent_fingerprint,
        }
    }

    pub fn child_number(&self) -> ChildNumber {
        match self {
            ExtendedKey::Private(xpriv) => xpriv.child_number,
            ExtendedKey::Public(xpub) => xpub.child_number,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.xpub().fingerprint()
    }

    /// Base58 `xpub`/`tpub` encoding of the public half.
    pub fn to_xpub_string(&self, network: Network) -> String {
        let mut xpub = self.xpub();
        xpub.network = network.to_bitcoin().into();
        xpub.to_string()
    }

    fn xpub(&self) -> Xpub {
        match self {
            ExtendedKey::Private(xpriv) => Xpub::from_priv(&Secp256k1::signing_only(), xpriv),
            ExtendedKey::Public(xpub) => *xpub,
        }
    }

    /// Extract the signing key pair. Fails for public-only keys.
    pub fn to_key_pair(&self) -> Result<KeyPair, KeyError> {
        match self {
            ExtendedKey::Private(xpriv) => Ok(KeyPair::from_secret_key(xpriv.private_key)),
            ExtendedKey::Public(_) => Err(KeyError::MissingPrivateKey),
        }
    }

    fn kind(&self) -> &'static str {
        if self.is_private() {
            "private"
        } else {
            "public"
        }
    }
}

impl Drop for ExtendedKey {
    fn drop(&mut self) {
        if let ExtendedKey::Private(xpriv) = self {
            xpriv.private_key.non_secure_erase();
        }
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("kind", &self.kind())
            .field("depth", &self.depth())
            .field("parent_fingerprint", &self.parent_fingerprint())
            .field("child_number", &self.child_number())
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

fn map_bip32_error(err: bip32::Error) -> KeyError {
    match err {
        bip32::Error::CannotDeriveFromHardenedKey => KeyError::DerivationFailed(
            "hardened step attempted on a public key".to_string(),
        ),
        bip32::Error::InvalidChildNumber(n) => KeyError::InvalidIndex(n.to_string()),
        bip32::Error::MaximumDepthExceeded => {
            KeyError::InvalidDerivationPath(format!("deeper than {MAX_DEPTH} levels"))
        }
        other => KeyError::DerivationFailed(other.to_string()),
    }
}

/// A secp256k1 signing key and its public point.
///
/// The scalar never leaves this type except through [`KeyPair::with_secret_key`]
/// (borrowed, for one operation) or [`KeyPair::expose_wif`] (an explicit
/// opt-in). It is erased when the pair is dropped.
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    fn from_secret_key(secret: SecretKey) -> Self {
        let public = secret.public_key(&Secp256k1::signing_only());
        KeyPair { secret, public }
    }

    /// Build a key pair from a raw 32-byte scalar.
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, KeyError> {
        let secret = SecretKey::from_slice(bytes)
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::from_secret_key(secret))
    }

    /// Import a compressed-key WIF (`K…`/`L…` mainnet, `c…` testnet).
    pub fn from_wif(wif: &str) -> Result<Self, KeyError> {
        let mut key = PrivateKey::from_wif(wif.trim())
            .map_err(|e| KeyError::InvalidWif(e.to_string()))?;
        if !key.compressed {
            key.inner.non_secure_erase();
            return Err(KeyError::InvalidWif(
                "uncompressed keys cannot own segwit outputs".to_string(),
            ));
        }
        let pair = Self::from_secret_key(key.inner);
        key.inner.non_secure_erase();
        Ok(pair)
    }

    /// Export the private key as WIF.
    ///
    /// This is the only way the scalar leaves the core. The returned string is
    /// zeroized when dropped.
    pub fn expose_wif(&self, network: Network) -> Zeroizing<String> {
        let mut key = PrivateKey::new(self.secret, network.to_bitcoin());
        let wif = Zeroizing::new(key.to_wif());
        key.inner.non_secure_erase();
        wif
    }

    /// Run `f` with a borrowed secret key.
    pub fn with_secret_key<R>(&self, f: impl FnOnce(&SecretKey) -> R) -> R {
        f(&self.secret)
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    pub fn compressed_public_key(&self) -> CompressedPublicKey {
        CompressedPublicKey(self.public)
    }

    /// The x-only (BIP-340) form used as a taproot internal key.
    pub fn x_only_public_key(&self) -> XOnlyPublicKey {
        self.public.x_only_public_key().0
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Derive the key pair at `path` from a mnemonic and passphrase.
pub fn derive_key(
    mnemonic: &str,
    passphrase: &str,
    path: &DerivationPath,
) -> Result<KeyPair, KeyError> {
    derive_key_with(mnemonic, passphrase, path, MnemonicOptions::default())
}

/// [`derive_key`] with explicit mnemonic validation options.
pub fn derive_key_with(
    mnemonic: &str,
    passphrase: &str,
    path: &DerivationPath,
    options: MnemonicOptions,
) -> Result<KeyPair, KeyError> {
    let mnemonic = parse_mnemonic_with(mnemonic, options)?;
    let seed = mnemonic_to_seed(&mnemonic, passphrase);
    let root = derive_root(&seed)?;
    root.derive_path(path)?.to_key_pair()
}
