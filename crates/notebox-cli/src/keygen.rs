//! # Key Generation
//!
//! Prints a fresh 32-byte master key as 64 lowercase hex characters, or
//! writes it to a file.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use notebox_crypto::MasterKey;

/// Keygen arguments.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Write the key to this file instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Overwrite an existing output file.
    #[arg(long)]
    pub force: bool,
}

/// Execute the keygen subcommand.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    let key = MasterKey::generate();
    match &args.out {
        None => println!("{}", key.to_hex().as_str()),
        Some(path) => {
            if path.exists() && !args.force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            std::fs::write(path, format!("{}\n", key.to_hex().as_str()))
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "master key written");
        }
    }
    Ok(0)
}
