//! # Master Key
//!
//! The long-lived AES-256 key that wraps every per-document key. It is
//! loaded once at start-up and handed to [`KeyWrapCipher`](crate::KeyWrapCipher);
//! nothing else reads it.
//!
//! ## Example
//!
//! ```bash
//! export NOTEBOX_MASTER_KEY="$(notebox keygen)"  # 64 hex chars
//! ```
//!
//! ## Security Invariants
//!
//! - Key bytes are zeroized on drop.
//! - `Debug` output is redacted.
//! - There is no accessor for the raw bytes outside this crate.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;

/// Environment variable the service reads the master key from.
pub const MASTER_KEY_ENV: &str = "NOTEBOX_MASTER_KEY";

/// Length of the master key in bytes.
pub const MASTER_KEY_LEN: usize = 32;

/// A 32-byte AES-256 key-wrapping key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; MASTER_KEY_LEN],
}

impl MasterKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; MASTER_KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Generate a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; MASTER_KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Parse a 64-character hex string. Surrounding whitespace is ignored.
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let decoded = Zeroizing::new(hex::decode(hex_str.trim()).map_err(|e| {
            CryptoError::InvalidMasterKey(format!("not valid hex: {e}"))
        })?);
        let bytes: [u8; MASTER_KEY_LEN] = decoded.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidMasterKey(format!(
                "expected {MASTER_KEY_LEN} bytes ({} hex chars), got {} bytes",
                MASTER_KEY_LEN * 2,
                decoded.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Load the key from the named environment variable.
    pub fn from_env(var_name: &str) -> Result<Self, CryptoError> {
        let raw = Zeroizing::new(std::env::var(var_name).map_err(|_| {
            CryptoError::MissingMasterKey(format!("environment variable {var_name} not set"))
        })?);
        Self::from_hex(&raw).map_err(|e| match e {
            CryptoError::InvalidMasterKey(msg) => {
                CryptoError::InvalidMasterKey(format!("{var_name}: {msg}"))
            }
            other => other,
        })
    }

    /// Hex encoding of the key, for `keygen` output only.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; MASTER_KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}
