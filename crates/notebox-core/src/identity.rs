//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the identifiers that flow through the
//! content pipeline. Each identifier is a distinct type and validates its
//! format at construction time, so downstream code never re-checks.
//!
//! | Type              | Origin                                   |
//! |-------------------|------------------------------------------|
//! | [`ContentId`]     | content store, identifies the envelope   |
//! | [`TokenId`]       | mint event of the token contract         |
//! | [`WalletAddress`] | author or buyer account on chain         |
//! | [`UserId`]        | session subject from the identity provider |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Implement `Deserialize` for string newtypes by routing through `new()`,
/// so invalid values are rejected at deserialization time.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// ContentId
// ---------------------------------------------------------------------------

/// Content-addressed identifier of a stored envelope.
///
/// Covers IPFS CIDv0 (`Qm…`), base32 CIDv1 (`bafy…`) and the 64-char hex
/// digests used by the local backends. Format: 1-128 ASCII alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContentId(String);

impl_validating_deserialize!(ContentId);

impl ContentId {
    /// Create a content identifier, validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidContentId`] for empty, overlong or
    /// non-alphanumeric input.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() || s.len() > 128 || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidContentId(s));
        }
        Ok(Self(s))
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// TokenId
// ---------------------------------------------------------------------------

/// On-chain ownership token identifier.
///
/// The contract uses `uint256`, but ids are allocated sequentially so a
/// `u128` holds every reachable value. Serialized as a decimal string
/// because JSON numbers lose precision past 2^53.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(u128);

impl TokenId {
    /// Wrap a raw token id.
    pub fn new(id: u128) -> Self {
        Self(id)
    }

    /// Return the raw numeric value.
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidTokenId(s.to_string()));
        }
        s.parse::<u128>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidTokenId(s.to_string()))
    }
}

impl From<u128> for TokenId {
    fn from(id: u128) -> Self {
        Self(id)
    }
}

impl Serialize for TokenId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// WalletAddress
// ---------------------------------------------------------------------------

/// Ethereum account address: `0x` followed by 40 hex characters.
///
/// Normalized to lower case at construction so equality and hashing are
/// case-insensitive (EIP-55 checksummed input is accepted).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WalletAddress(String);

impl_validating_deserialize!(WalletAddress);

impl WalletAddress {
    /// Create a wallet address, validating `^0x[a-fA-F0-9]{40}$`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidWalletAddress`] on any mismatch.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let valid = s.len() == 42
            && s.starts_with("0x")
            && s[2..].chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            return Err(ValidationError::InvalidWalletAddress(s));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Return the `0x`-prefixed lower-case address.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the 40 hex characters without the `0x` prefix.
    pub fn hex_digits(&self) -> &str {
        &self.0[2..]
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// Opaque session subject issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UserId(String);

impl_validating_deserialize!(UserId);

impl UserId {
    /// Create a user identifier (1-256 characters, not all whitespace).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidUserId`] for blank or overlong input.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.trim().is_empty() || s.len() > 256 {
            return Err(ValidationError::InvalidUserId(s));
        }
        Ok(Self(s))
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_id_accepts_cid_and_digest_forms() {
        assert!(ContentId::new("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").is_ok());
        assert!(ContentId::new(
            "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi"
        )
        .is_ok());
        assert!(ContentId::new("a".repeat(64)).is_ok());
    }

    #[test]
    fn content_id_rejects_separators_and_blank() {
        assert!(ContentId::new("").is_err());
        assert!(ContentId::new("Qm/../etc").is_err());
        assert!(ContentId::new("abc:def").is_err());
        assert!(ContentId::new("a".repeat(129)).is_err());
    }

    #[test]
    fn content_id_deserialize_validates() {
        let ok: Result<ContentId, _> = serde_json::from_str("\"QmAbc123\"");
        assert!(ok.is_ok());
        let bad: Result<ContentId, _> = serde_json::from_str("\"has space\"");
        assert!(bad.is_err());
    }

    #[test]
    fn token_id_serializes_as_decimal_string() {
        let id = TokenId::new(340_282_366_920_938_463_463_374_607_431_768_211_455);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"340282366920938463463374607431768211455\"");
        let back: TokenId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn token_id_rejects_signs_and_garbage() {
        assert!("-1".parse::<TokenId>().is_err());
        assert!("+1".parse::<TokenId>().is_err());
        assert!("".parse::<TokenId>().is_err());
        assert!("0x10".parse::<TokenId>().is_err());
        assert_eq!("42".parse::<TokenId>().unwrap().value(), 42);
    }

    #[test]
    fn wallet_address_normalizes_case() {
        let mixed = WalletAddress::new("0x52908400098527886E0F7030069857D2E4169EE7").unwrap();
        let lower = WalletAddress::new("0x52908400098527886e0f7030069857d2e4169ee7").unwrap();
        assert_eq!(mixed, lower);
        assert_eq!(mixed.as_str(), "0x52908400098527886e0f7030069857d2e4169ee7");
        assert_eq!(mixed.hex_digits().len(), 40);
    }

    #[test]
    fn wallet_address_rejects_malformed() {
        assert!(WalletAddress::new("52908400098527886e0f7030069857d2e4169ee7").is_err());
        assert!(WalletAddress::new("0x52908400098527886e0f7030069857d2e4169ee").is_err());
        assert!(WalletAddress::new("0x52908400098527886e0f7030069857d2e4169eeg").is_err());
        assert!(WalletAddress::new("0X52908400098527886e0f7030069857d2e4169ee7").is_err());
    }

    #[test]
    fn user_id_rejects_blank() {
        assert!(UserId::new("   ").is_err());
        assert!(UserId::new("").is_err());
        assert_eq!(UserId::new("ck1user").unwrap().as_str(), "ck1user");
    }
}
