//! Chain error types.
//!
//! Submission failure and confirmation timeout are separate variants: the
//! first means no transaction exists, the second means one may still land.

use std::time::Duration;

/// Errors from [`TokenMintService`](crate::TokenMintService) backends.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The node refused or failed to accept the transaction.
    #[error("transaction submission failed: {0}")]
    Submission(String),

    /// The transaction was accepted but no receipt arrived before the deadline.
    #[error("transaction {tx_hash} not confirmed within {waited:?}")]
    ConfirmationTimeout {
        /// Hash of the pending transaction.
        tx_hash: String,
        /// How long confirmation was awaited.
        waited: Duration,
    },

    /// The transaction was mined with a failure status.
    #[error("transaction {tx_hash} reverted: {reason}")]
    Reverted {
        /// Hash of the reverted transaction.
        tx_hash: String,
        /// Revert reason, when known.
        reason: String,
    },

    /// The mint receipt carried no mint event from the contract.
    #[error("transaction {tx_hash} emitted no mint event")]
    EventMissing {
        /// Hash of the mint transaction.
        tx_hash: String,
    },

    /// The node returned a JSON-RPC error object.
    #[error("JSON-RPC {method} failed ({code}): {message}")]
    Rpc {
        /// Method called.
        method: String,
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the node.
        message: String,
    },

    /// The node could not be reached.
    #[error("JSON-RPC transport error calling {method}: {reason}")]
    Transport {
        /// Method called.
        method: String,
        /// Underlying failure.
        reason: String,
    },

    /// The node's answer could not be decoded.
    #[error("invalid chain response: {0}")]
    InvalidResponse(String),
}

impl ChainError {
    /// Whether retrying a read-only call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_and_timeout_render_differently() {
        let sub = ChainError::Submission("nonce too low".into());
        let timeout = ChainError::ConfirmationTimeout {
            tx_hash: "0xabc".into(),
            waited: Duration::from_secs(120),
        };
        assert!(format!("{sub}").contains("submission"));
        assert!(format!("{timeout}").contains("not confirmed"));
    }

    #[test]
    fn only_transport_is_transient() {
        assert!(ChainError::Transport {
            method: "eth_getTransactionReceipt".into(),
            reason: "connection reset".into()
        }
        .is_transient());
        assert!(!ChainError::Rpc {
            method: "eth_sendTransaction".into(),
            code: -32000,
            message: "insufficient funds".into()
        }
        .is_transient());
    }
}
