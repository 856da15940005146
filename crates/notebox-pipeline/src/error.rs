//! # Pipeline Error Taxonomy
//!
//! One enum for every failure a pipeline operation can surface. Collaborator
//! errors are folded in here so callers match on a single type; the HTTP
//! layer maps each variant to one status.
//!
//! Storage timeouts stay [`PipelineError::Timeout`] and are never reported
//! as [`PipelineError::NotFound`].

use notebox_chain::ChainError;
use notebox_core::{ContentId, ValidationError};
use notebox_crypto::CryptoError;
use notebox_preview::PreviewError;
use notebox_store::StoreError;

use crate::metadata::MetadataError;

/// Errors from [`DocumentPipeline`](crate::DocumentPipeline) operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Upload is not an accepted PDF, or a stored document cannot be previewed.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Request fields failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Stored envelope failed to parse or authenticate.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Unknown content identifier.
    #[error("content {0} not found")]
    NotFound(String),

    /// Requester may not download this content.
    #[error("requester is not authorized for this content")]
    Unauthorized,

    /// Requester already owns the content being purchased.
    #[error("content {0} is already owned by the requester")]
    AlreadyOwned(ContentId),

    /// Mint or purchase failed on chain.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Content store call exceeded its deadline.
    #[error("storage timed out: {0}")]
    Timeout(String),

    /// Content store transport or backend failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Metadata store failure.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Unexpected local failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CryptoError> for PipelineError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidFormat(msg) => Self::InvalidFormat(msg),
            CryptoError::Decryption(msg) => Self::Decryption(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id),
            e @ StoreError::Timeout { .. } => Self::Timeout(e.to_string()),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<PreviewError> for PipelineError {
    fn from(e: PreviewError) -> Self {
        match e {
            PreviewError::Parse(msg) | PreviewError::PageTree(msg) => Self::InvalidFormat(msg),
            PreviewError::Serialize(msg) => Self::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn store_timeout_is_not_not_found() {
        let err: PipelineError = StoreError::Timeout {
            operation: "get",
            elapsed: Duration::from_secs(30),
        }
        .into();
        assert!(matches!(err, PipelineError::Timeout(_)));

        let err: PipelineError = StoreError::NotFound("QmGone".into()).into();
        assert!(matches!(err, PipelineError::NotFound(ref id) if id == "QmGone"));
    }

    #[test]
    fn crypto_errors_fold_into_taxonomy() {
        assert!(matches!(
            PipelineError::from(CryptoError::InvalidFormat("x".into())),
            PipelineError::InvalidFormat(_)
        ));
        assert!(matches!(
            PipelineError::from(CryptoError::Decryption("x".into())),
            PipelineError::Decryption(_)
        ));
        assert!(matches!(
            PipelineError::from(CryptoError::Encryption("x".into())),
            PipelineError::Internal(_)
        ));
    }

    #[test]
    fn unparseable_preview_is_invalid_format() {
        assert!(matches!(
            PipelineError::from(PreviewError::Parse("bad xref".into())),
            PipelineError::InvalidFormat(_)
        ));
    }

    #[test]
    fn chain_submission_and_timeout_stay_distinct() {
        let sub = PipelineError::from(ChainError::Submission("rejected".into()));
        let timeout = PipelineError::from(ChainError::ConfirmationTimeout {
            tx_hash: "0x1".into(),
            waited: Duration::from_secs(1),
        });
        assert!(matches!(sub, PipelineError::Chain(ChainError::Submission(_))));
        assert!(matches!(
            timeout,
            PipelineError::Chain(ChainError::ConfirmationTimeout { .. })
        ));
    }
}
