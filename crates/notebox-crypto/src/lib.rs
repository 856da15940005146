//! # notebox-crypto — Envelope Encryption
//!
//! Every uploaded note is encrypted under its own random key before it
//! leaves the process, and that key is stored next to the ciphertext only in
//! wrapped form:
//!
//! - **Content encryption**: AES-256-GCM with a fresh 32-byte key and
//!   12-byte IV per document. The GCM tag is the integrity check.
//! - **Key wrapping**: the per-document key is sealed with AES-256-GCM under
//!   the [`MasterKey`], which is loaded once at start-up and injected.
//! - **Wire format**: [`EncryptionEnvelope`] serializes as
//!   `ivHex:wrappedKeyHex:ciphertextHex`, stored verbatim in the content
//!   store.
//! - **Format gate**: [`validate_format`] accepts only `%PDF` input and runs
//!   before any encryption or network call.
//!
//! ## Crate Policy
//!
//! - No hidden global state: all operations are functions of the explicit
//!   master key and their input.
//! - Key material is zeroized on drop and never logged.

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod format;
pub mod master_key;

pub use cipher::KeyWrapCipher;
pub use envelope::EncryptionEnvelope;
pub use error::CryptoError;
pub use format::{validate_format, PDF_MAGIC};
pub use master_key::MasterKey;
