//! # Marketplace Records
//!
//! The records the content pipeline produces and consumes. Persistence of
//! [`Document`] and [`PurchaseRecord`] belongs to the external metadata
//! store; these types only fix their shape.
//!
//! ## Lifecycle
//!
//! - A [`Document`] exists only after publish has validated, encrypted,
//!   stored and minted.
//! - An [`OwnershipToken`] is minted exactly once per document and never
//!   changes afterwards.
//! - A [`PurchaseRecord`] is written only after the purchase transaction is
//!   confirmed, and at most once per `(user_id, content_id)`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{ContentId, TokenId, UserId, WalletAddress};
use crate::price::Price;

/// A published, encrypted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Identifier of the stored envelope (never of the plaintext).
    pub content_id: ContentId,
    /// Session subject of the author.
    pub owner_id: UserId,
    /// Listing price.
    pub price: Price,
    /// Ownership token minted for this document.
    pub token_id: TokenId,
    /// Display title.
    pub name: String,
    /// Course the note belongs to.
    pub course_id: String,
    /// Free-form description.
    pub description: String,
    /// When publish completed.
    pub created_at: DateTime<Utc>,
}

/// The on-chain ownership token minted at publish time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipToken {
    /// Identifier assigned by the contract's mint event.
    pub token_id: TokenId,
    /// Author address the token was issued to.
    pub owner_address: WalletAddress,
    /// Listing price in chain base units, as a decimal string.
    #[serde(with = "u128_string")]
    pub price_in_base_units: u128,
}

/// Proof that a user bought a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    /// Buyer's session subject.
    pub user_id: UserId,
    /// Purchased envelope.
    pub content_id: ContentId,
    /// When the confirmed purchase was recorded.
    pub timestamp: DateTime<Utc>,
}

impl PurchaseRecord {
    /// Create a record stamped with the current time.
    pub fn now(user_id: UserId, content_id: ContentId) -> Self {
        Self {
            user_id,
            content_id,
            timestamp: Utc::now(),
        }
    }
}

/// What a retrieval request wants back.
///
/// Replaces string-keyed dispatch: every consumer matches both variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrieveAction {
    /// Public, truncated preview with a trailing sentinel page.
    Preview,
    /// Full plaintext, for the author or a purchaser only.
    Download,
}

impl RetrieveAction {
    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Download => "download",
        }
    }

    /// Whether this action requires an authorized requester.
    pub fn requires_authorization(&self) -> bool {
        match self {
            Self::Preview => false,
            Self::Download => true,
        }
    }
}

impl fmt::Display for RetrieveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetrieveAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preview" => Ok(Self::Preview),
            "download" => Ok(Self::Download),
            other => Err(ValidationError::InvalidAction(other.to_string())),
        }
    }
}

mod u128_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parses_exactly_two_names() {
        assert_eq!("preview".parse::<RetrieveAction>().unwrap(), RetrieveAction::Preview);
        assert_eq!("download".parse::<RetrieveAction>().unwrap(), RetrieveAction::Download);
        assert!("Preview".parse::<RetrieveAction>().is_err());
        assert!("delete".parse::<RetrieveAction>().is_err());
        assert!("".parse::<RetrieveAction>().is_err());
    }

    #[test]
    fn only_download_requires_authorization() {
        assert!(!RetrieveAction::Preview.requires_authorization());
        assert!(RetrieveAction::Download.requires_authorization());
    }

    #[test]
    fn action_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&RetrieveAction::Download).unwrap(),
            "\"download\""
        );
    }

    #[test]
    fn ownership_token_serializes_units_as_string() {
        let token = OwnershipToken {
            token_id: TokenId::new(7),
            owner_address: WalletAddress::new(format!("0x{}", "a".repeat(40))).unwrap(),
            price_in_base_units: 500_000_000_000_000_000,
        };
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["tokenId"], "7");
        assert_eq!(json["priceInBaseUnits"], "500000000000000000");
        let back: OwnershipToken = serde_json::from_value(json).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn document_uses_camel_case() {
        let doc = Document {
            content_id: ContentId::new("QmTest").unwrap(),
            owner_id: UserId::new("user-1").unwrap(),
            price: Price::parse("0.5").unwrap(),
            token_id: TokenId::new(1),
            name: "Linear Algebra week 3".into(),
            course_id: "MATH201".into(),
            description: String::new(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["contentId"], "QmTest");
        assert_eq!(json["courseId"], "MATH201");
        assert_eq!(json["price"], "0.5");
    }
}
