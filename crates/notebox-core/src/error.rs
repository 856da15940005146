//! # Validation Errors
//!
//! Domain primitive validation failures, built with `thiserror`. Every
//! variant carries the rejected input so operators can see what was sent.

use thiserror::Error;

/// Validation failure for a domain primitive or request field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Content identifier is empty, too long, or contains non-alphanumerics.
    #[error("invalid content id: \"{0}\" (expected 1-128 alphanumeric characters)")]
    InvalidContentId(String),

    /// Token identifier is not an unsigned decimal integer.
    #[error("invalid token id: \"{0}\" (expected an unsigned decimal integer)")]
    InvalidTokenId(String),

    /// Wallet address does not match `0x` followed by 40 hex characters.
    #[error("invalid wallet address: \"{0}\" (expected 0x followed by 40 hex characters)")]
    InvalidWalletAddress(String),

    /// User identifier is empty or too long.
    #[error("invalid user id: \"{0}\" (expected 1-256 characters)")]
    InvalidUserId(String),

    /// Price is not a non-negative decimal with at most 18 fractional digits.
    #[error("invalid price: \"{0}\" (expected a non-negative decimal with at most 18 fractional digits)")]
    InvalidPrice(String),

    /// Price exceeds the marketplace ceiling.
    #[error("price {0} exceeds the maximum of {1}")]
    PriceTooHigh(String, u64),

    /// Retrieval action is neither `preview` nor `download`.
    #[error("invalid action: \"{0}\" (expected \"preview\" or \"download\")")]
    InvalidAction(String),

    /// A required form field is missing or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_address_display_includes_input() {
        let err = ValidationError::InvalidWalletAddress("0x12".into());
        let msg = format!("{err}");
        assert!(msg.contains("0x12"));
        assert!(msg.contains("40 hex"));
    }

    #[test]
    fn price_too_high_display() {
        let err = ValidationError::PriceTooHigh("2000000".into(), 1_000_000);
        assert_eq!(format!("{err}"), "price 2000000 exceeds the maximum of 1000000");
    }

    #[test]
    fn missing_field_display() {
        let err = ValidationError::MissingField("courseId");
        assert_eq!(format!("{err}"), "missing required field: courseId");
    }
}
