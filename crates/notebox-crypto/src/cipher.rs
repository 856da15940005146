//! # Key-Wrapping Cipher
//!
//! Two-layer AES-256-GCM: a fresh document key encrypts the plaintext, and
//! the master key encrypts the document key. Only the master key is
//! long-lived; document keys exist in memory for the duration of one call.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::envelope::{EncryptionEnvelope, DOCUMENT_KEY_LEN, IV_LEN};
use crate::error::CryptoError;
use crate::master_key::MasterKey;

/// Envelope encryption under an injected [`MasterKey`].
#[derive(Debug, Clone)]
pub struct KeyWrapCipher {
    master: MasterKey,
}

impl KeyWrapCipher {
    /// Create a cipher bound to `master`.
    pub fn new(master: MasterKey) -> Self {
        Self { master }
    }

    /// Accept only PDF input. See [`crate::validate_format`].
    pub fn validate_format(bytes: &[u8]) -> Result<(), CryptoError> {
        crate::format::validate_format(bytes)
    }

    /// Encrypt `plaintext` under a fresh document key and IV.
    ///
    /// Two calls on identical input produce different envelopes.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptionEnvelope, CryptoError> {
        let mut doc_key = Zeroizing::new([0u8; DOCUMENT_KEY_LEN]);
        OsRng.fill_bytes(&mut doc_key[..]);
        let iv = random_nonce();

        let content_cipher = Aes256Gcm::new_from_slice(&doc_key[..])
            .map_err(|e| CryptoError::Encryption(format!("document key: {e}")))?;
        let ciphertext = content_cipher
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|_| CryptoError::Encryption("content encryption failed".into()))?;

        let wrapped_key = self.wrap_key(&doc_key[..])?;
        tracing::debug!(
            plaintext_len = plaintext.len(),
            ciphertext_len = ciphertext.len(),
            "document encrypted"
        );
        EncryptionEnvelope::new(iv, wrapped_key, ciphertext)
    }

    /// Unwrap the document key and decrypt the envelope.
    ///
    /// # Errors
    ///
    /// [`CryptoError::Decryption`] if the key does not unwrap under this
    /// master key or the ciphertext fails its integrity check.
    pub fn decrypt(&self, envelope: &EncryptionEnvelope) -> Result<Vec<u8>, CryptoError> {
        let doc_key = self.unwrap_key(envelope.wrapped_key())?;
        let content_cipher = Aes256Gcm::new_from_slice(&doc_key[..])
            .map_err(|e| CryptoError::Decryption(format!("document key: {e}")))?;
        content_cipher
            .decrypt(Nonce::from_slice(envelope.iv()), envelope.ciphertext())
            .map_err(|_| CryptoError::Decryption("content integrity check failed".into()))
    }

    /// Parse stored envelope bytes and decrypt them.
    pub fn decrypt_bytes(&self, stored: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let envelope = EncryptionEnvelope::parse(stored)?;
        self.decrypt(&envelope)
    }

    fn master_cipher(&self) -> Result<Aes256Gcm, CryptoError> {
        Aes256Gcm::new_from_slice(self.master.as_bytes())
            .map_err(|e| CryptoError::InvalidMasterKey(e.to_string()))
    }

    fn wrap_key(&self, doc_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce = random_nonce();
        let sealed = self
            .master_cipher()?
            .encrypt(Nonce::from_slice(&nonce), doc_key)
            .map_err(|_| CryptoError::Encryption("key wrapping failed".into()))?;
        let mut wrapped = Vec::with_capacity(IV_LEN + sealed.len());
        wrapped.extend_from_slice(&nonce);
        wrapped.extend_from_slice(&sealed);
        Ok(wrapped)
    }

    fn unwrap_key(&self, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        if wrapped.len() <= IV_LEN {
            return Err(CryptoError::Decryption("wrapped key too short".into()));
        }
        let (nonce, sealed) = wrapped.split_at(IV_LEN);
        let key = self
            .master_cipher()?
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CryptoError::Decryption("document key does not unwrap".into()))?;
        Ok(Zeroizing::new(key))
    }
}

fn random_nonce() -> [u8; IV_LEN] {
    let mut nonce = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}
