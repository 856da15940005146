//! # Access Gate
//!
//! A requester may download a document if they authored it or bought it.
//! Nothing else grants access. Authorization is a pure read of the
//! metadata store; only [`AccessGate::record_purchase`] writes, and only
//! after the purchase is confirmed on chain.

use std::sync::Arc;

use notebox_core::{ContentId, PurchaseRecord, UserId};

use crate::error::PipelineError;
use crate::metadata::MetadataStore;

/// Ownership-based authorization over a [`MetadataStore`].
#[derive(Clone)]
pub struct AccessGate {
    metadata: Arc<dyn MetadataStore>,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate").finish_non_exhaustive()
    }
}

impl AccessGate {
    /// Create a gate reading from `metadata`.
    pub fn new(metadata: Arc<dyn MetadataStore>) -> Self {
        Self { metadata }
    }

    /// Whether `requester` authored or purchased `content_id`.
    ///
    /// Unknown content is never authorized.
    pub async fn is_authorized(
        &self,
        requester: &UserId,
        content_id: &ContentId,
    ) -> Result<bool, PipelineError> {
        let Some(document) = self.metadata.document(content_id).await? else {
            return Ok(false);
        };
        if &document.owner_id == requester {
            return Ok(true);
        }
        Ok(self.metadata.has_purchase(requester, content_id).await?)
    }

    /// Record a confirmed purchase. Recording an existing purchase again
    /// succeeds without change.
    pub async fn record_purchase(
        &self,
        requester: &UserId,
        content_id: &ContentId,
    ) -> Result<(), PipelineError> {
        if self.metadata.document(content_id).await?.is_none() {
            return Err(PipelineError::NotFound(content_id.to_string()));
        }
        let inserted = self
            .metadata
            .insert_purchase(PurchaseRecord::now(requester.clone(), content_id.clone()))
            .await?;
        if inserted {
            tracing::info!(requester = %requester, content_id = %content_id, "purchase recorded");
        } else {
            tracing::debug!(requester = %requester, content_id = %content_id, "purchase already recorded");
        }
        Ok(())
    }
}
