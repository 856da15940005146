//! # Encryption Envelope
//!
//! The persisted form of an encrypted document:
//!
//! ```text
//! ivHex ":" wrappedKeyHex ":" ciphertextHex
//! ```
//!
//! - `iv` is the 12-byte AES-GCM nonce used for the content.
//! - `wrappedKey` is `nonce(12) ‖ AES-GCM(masterKey, documentKey)`, which is
//!   60 bytes for a 32-byte document key.
//! - `ciphertext` is the AES-GCM output over the plaintext, tag included.
//!
//! Hex is lowercase on output and accepted in either case on input. The
//! envelope is ASCII, so it can be stored and fetched as an opaque blob.

use crate::error::CryptoError;

/// Length of the AES-GCM nonce, in bytes.
pub const IV_LEN: usize = 12;
/// Length of the AES-GCM authentication tag, in bytes.
pub const TAG_LEN: usize = 16;
/// Length of a per-document key, in bytes.
pub const DOCUMENT_KEY_LEN: usize = 32;
/// Length of a wrapped per-document key, in bytes.
pub const WRAPPED_KEY_LEN: usize = IV_LEN + DOCUMENT_KEY_LEN + TAG_LEN;

const SEPARATOR: char = ':';

/// A parsed `iv:wrappedKey:ciphertext` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionEnvelope {
    iv: [u8; IV_LEN],
    wrapped_key: Vec<u8>,
    ciphertext: Vec<u8>,
}

impl EncryptionEnvelope {
    /// Assemble an envelope from its parts.
    pub fn new(
        iv: [u8; IV_LEN],
        wrapped_key: Vec<u8>,
        ciphertext: Vec<u8>,
    ) -> Result<Self, CryptoError> {
        if wrapped_key.len() != WRAPPED_KEY_LEN {
            return Err(CryptoError::Decryption(format!(
                "wrapped key must be {WRAPPED_KEY_LEN} bytes, got {}",
                wrapped_key.len()
            )));
        }
        if ciphertext.len() < TAG_LEN {
            return Err(CryptoError::Decryption(format!(
                "ciphertext must be at least {TAG_LEN} bytes, got {}",
                ciphertext.len()
            )));
        }
        Ok(Self {
            iv,
            wrapped_key,
            ciphertext,
        })
    }

    /// Parse stored envelope bytes.
    ///
    /// # Errors
    ///
    /// [`CryptoError::Decryption`] when the input is not ASCII, does not have
    /// exactly three fields, contains invalid hex, or has wrong field lengths.
    pub fn parse(bytes: &[u8]) -> Result<Self, CryptoError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| CryptoError::Decryption("envelope is not ASCII text".into()))?;
        let text = text.trim_end_matches(['\n', '\r']);

        let fields: Vec<&str> = text.split(SEPARATOR).collect();
        if fields.len() != 3 {
            return Err(CryptoError::Decryption(format!(
                "expected 3 fields, got {}",
                fields.len()
            )));
        }

        let iv_bytes = decode_field("iv", fields[0])?;
        let iv: [u8; IV_LEN] = iv_bytes.as_slice().try_into().map_err(|_| {
            CryptoError::Decryption(format!(
                "iv must be {IV_LEN} bytes, got {}",
                iv_bytes.len()
            ))
        })?;
        let wrapped_key = decode_field("wrapped key", fields[1])?;
        let ciphertext = decode_field("ciphertext", fields[2])?;

        Self::new(iv, wrapped_key, ciphertext)
    }

    /// Serialize to the stored form.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Content nonce.
    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    /// Wrapped per-document key.
    pub fn wrapped_key(&self) -> &[u8] {
        &self.wrapped_key
    }

    /// Content ciphertext including the tag.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

impl std::fmt::Display for EncryptionEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            hex::encode(self.iv),
            hex::encode(&self.wrapped_key),
            hex::encode(&self.ciphertext)
        )
    }
}

fn decode_field(name: &str, field: &str) -> Result<Vec<u8>, CryptoError> {
    hex::decode(field).map_err(|e| CryptoError::Decryption(format!("{name} is not valid hex: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EncryptionEnvelope {
        EncryptionEnvelope::new([0x01; IV_LEN], vec![0x02; WRAPPED_KEY_LEN], vec![0x03; 20]).unwrap()
    }

    #[test]
    fn serializes_as_three_lowercase_hex_fields() {
        let text = sample().to_string();
        let fields: Vec<&str> = text.split(':').collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0], "01".repeat(IV_LEN));
        assert_eq!(fields[1].len(), WRAPPED_KEY_LEN * 2);
        assert_eq!(fields[2], "03".repeat(20));
    }

    #[test]
    fn parse_accepts_serialized_form() {
        let env = sample();
        assert_eq!(EncryptionEnvelope::parse(&env.to_bytes()).unwrap(), env);
    }

    #[test]
    fn parse_accepts_uppercase_hex_and_trailing_newline() {
        let mut text = sample().to_string().to_uppercase();
        text.push('\n');
        assert_eq!(EncryptionEnvelope::parse(text.as_bytes()).unwrap(), sample());
    }

    #[test]
    fn parse_rejects_wrong_field_count() {
        for input in ["", "aa", "aa:bb", "aa:bb:cc:dd"] {
            let err = EncryptionEnvelope::parse(input.as_bytes()).unwrap_err();
            assert!(matches!(err, CryptoError::Decryption(_)), "input {input:?}");
        }
    }

    #[test]
    fn parse_rejects_bad_hex() {
        let text = sample().to_string().replacen('0', "g", 1);
        assert!(matches!(
            EncryptionEnvelope::parse(text.as_bytes()),
            Err(CryptoError::Decryption(_))
        ));
    }

    #[test]
    fn parse_rejects_wrong_lengths() {
        let short_iv = format!("{}:{}:{}", "01".repeat(16), "02".repeat(WRAPPED_KEY_LEN), "03".repeat(20));
        assert!(EncryptionEnvelope::parse(short_iv.as_bytes()).is_err());

        let short_key = format!("{}:{}:{}", "01".repeat(IV_LEN), "02".repeat(16), "03".repeat(20));
        assert!(EncryptionEnvelope::parse(short_key.as_bytes()).is_err());

        let no_tag = format!("{}:{}:{}", "01".repeat(IV_LEN), "02".repeat(WRAPPED_KEY_LEN), "03".repeat(4));
        assert!(EncryptionEnvelope::parse(no_tag.as_bytes()).is_err());
    }

    #[test]
    fn parse_rejects_non_utf8() {
        assert!(EncryptionEnvelope::parse(&[0xff, 0xfe, b':', b':']).is_err());
    }
}
