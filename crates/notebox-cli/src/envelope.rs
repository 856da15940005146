//! # Seal and Open
//!
//! Offline envelope encryption of a single file, producing the same
//! `iv:wrappedKey:ciphertext` text the service stores. Useful for
//! migrating documents and for inspecting a stored blob.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use notebox_crypto::master_key::MASTER_KEY_ENV;
use notebox_crypto::{KeyWrapCipher, MasterKey};

/// Where the master key comes from.
#[derive(Args, Debug, Clone)]
pub struct KeySource {
    /// Read the hex master key from this file instead of the environment.
    #[arg(long)]
    pub key_file: Option<PathBuf>,

    /// Environment variable holding the hex master key.
    #[arg(long, default_value = MASTER_KEY_ENV)]
    pub key_env: String,
}

impl KeySource {
    /// Load the master key.
    pub fn load(&self) -> Result<MasterKey> {
        match &self.key_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading key file {}", path.display()))?;
                MasterKey::from_hex(&raw)
                    .with_context(|| format!("parsing key file {}", path.display()))
            }
            None => MasterKey::from_env(&self.key_env).context("loading master key"),
        }
    }
}

/// Seal arguments.
#[derive(Args, Debug)]
pub struct SealArgs {
    /// PDF to encrypt.
    pub input: PathBuf,
    /// Envelope output path.
    pub output: PathBuf,
    #[command(flatten)]
    pub key: KeySource,
}

/// Open arguments.
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Envelope to decrypt.
    pub input: PathBuf,
    /// Plaintext output path.
    pub output: PathBuf,
    #[command(flatten)]
    pub key: KeySource,
}

/// Execute the seal subcommand.
pub fn run_seal(args: &SealArgs) -> Result<u8> {
    let cipher = KeyWrapCipher::new(args.key.load()?);
    seal_file(&cipher, &args.input, &args.output)?;
    Ok(0)
}

/// Execute the open subcommand.
pub fn run_open(args: &OpenArgs) -> Result<u8> {
    let cipher = KeyWrapCipher::new(args.key.load()?);
    open_file(&cipher, &args.input, &args.output)?;
    Ok(0)
}

/// Encrypt `input` into an envelope at `output`. Only PDFs are accepted.
pub fn seal_file(cipher: &KeyWrapCipher, input: &Path, output: &Path) -> Result<()> {
    let plaintext =
        std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    KeyWrapCipher::validate_format(&plaintext)
        .with_context(|| format!("{} is not a PDF", input.display()))?;
    let envelope = cipher.encrypt(&plaintext).context("encrypting")?;
    std::fs::write(output, envelope.to_bytes())
        .with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        size = plaintext.len(),
        "sealed"
    );
    Ok(())
}

/// Decrypt the envelope at `input` into `output`.
pub fn open_file(cipher: &KeyWrapCipher, input: &Path, output: &Path) -> Result<()> {
    let stored = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let plaintext = cipher
        .decrypt_bytes(&stored)
        .with_context(|| format!("decrypting {}", input.display()))?;
    std::fs::write(output, &plaintext)
        .with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        size = plaintext.len(),
        "opened"
    );
    Ok(())
}
