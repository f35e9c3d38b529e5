//! Derive an address from a mnemonic and print its public summary
//! Run with: cargo run --example derive_address -- "<mnemonic words>" [config.toml]

use std::path::Path;

use ownproof_core::{derive_key_with, Config, DerivedAccount};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    ownproof_core::memory::disable_core_dumps();

    let mut args = std::env::args().skip(1);
    let mnemonic = args
        .next()
        .ok_or("usage: derive_address \"<mnemonic words>\" [config.toml]")?;

    let mut config = match args.next() {
        Some(path) => Config::from_file(Path::new(&path))?,
        None => Config::default(),
    };
    config.apply_env_overrides()?;
    config.validate()?;

    let path = config.derivation_path()?;
    let key = derive_key_with(&mnemonic, "", &path, config.mnemonic_options())?;
    let account =
        DerivedAccount::describe(&key, &path, config.wallet.network, config.wallet.script_type)?;

    // Public data only; the key pair is dropped (and erased) here.
    println!("{}", serde_json::to_string_pretty(&account)?);
    Ok(())
}
