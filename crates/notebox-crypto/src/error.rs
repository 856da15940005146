//! # Cryptographic Error Types
//!
//! Structured errors for envelope encryption, built with `thiserror`.
//! Messages never include key material or plaintext.

use thiserror::Error;

/// Errors from envelope encryption and the format gate.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Input is not an accepted document type.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Envelope is malformed or failed its integrity check.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Encryption could not be performed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Master key material has the wrong length or encoding.
    #[error("invalid master key: {0}")]
    InvalidMasterKey(String),

    /// Master key is not configured.
    #[error("master key not configured: {0}")]
    MissingMasterKey(String),
}
