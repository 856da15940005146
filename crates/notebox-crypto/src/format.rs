//! # Document Format Gate
//!
//! Only PDF documents are accepted. The check runs before encryption,
//! storage or minting, so a rejected upload has no side effects.

use crate::error::CryptoError;

/// The four-byte PDF file signature.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Accept `bytes` only if it starts with [`PDF_MAGIC`].
///
/// # Errors
///
/// Returns [`CryptoError::InvalidFormat`] for shorter input or any other
/// leading bytes.
pub fn validate_format(bytes: &[u8]) -> Result<(), CryptoError> {
    if bytes.len() < PDF_MAGIC.len() {
        return Err(CryptoError::InvalidFormat(format!(
            "input is {} bytes, shorter than the PDF signature",
            bytes.len()
        )));
    }
    if &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(CryptoError::InvalidFormat(
            "missing %PDF signature; only PDF documents are accepted".into(),
        ));
    }
    Ok(())
}
