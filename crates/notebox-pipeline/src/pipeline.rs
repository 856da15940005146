//! # Document Pipeline
//!
//! Wires the cipher, content store, token service, metadata store and
//! preview generator into the publish, retrieve and purchase flows.
//!
//! ## Ordering
//!
//! Publish is strictly `validate → encrypt → put → mint`, each step
//! consuming the previous step's output. Retrieval authorizes before it
//! fetches. Purchase settles on chain before it records.
//!
//! Mint and purchase failures are surfaced as-is and never retried here: a
//! blind retry risks a second token or a second payment.

use std::sync::Arc;

use chrono::Utc;
use notebox_chain::{PurchaseReceipt, TokenMintService};
use notebox_core::{ContentId, Document, Price, RetrieveAction, TokenId, UserId, WalletAddress};
use notebox_crypto::{EncryptionEnvelope, KeyWrapCipher};
use notebox_preview::PreviewGenerator;
use notebox_store::ContentStore;
use serde::Serialize;

use crate::access::AccessGate;
use crate::error::PipelineError;
use crate::form::{FileUpload, PublishForm};
use crate::metadata::MetadataStore;

/// Identifiers produced by [`DocumentPipeline::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Stored envelope.
    pub content_id: ContentId,
    /// Minted ownership token.
    pub token_id: TokenId,
}

/// Result of [`DocumentPipeline::publish_note`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedNote {
    /// Stored envelope.
    #[serde(rename = "id")]
    pub content_id: ContentId,
    /// Minted ownership token.
    pub token_id: TokenId,
}

/// The encrypted content pipeline.
#[derive(Clone)]
pub struct DocumentPipeline {
    cipher: KeyWrapCipher,
    store: Arc<dyn ContentStore>,
    tokens: Arc<dyn TokenMintService>,
    metadata: Arc<dyn MetadataStore>,
    gate: AccessGate,
    preview: PreviewGenerator,
}

impl std::fmt::Debug for DocumentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentPipeline")
            .field("store", &self.store.backend_name())
            .field("tokens", &self.tokens.backend_name())
            .finish_non_exhaustive()
    }
}

impl DocumentPipeline {
    /// Assemble a pipeline from its collaborators.
    pub fn new(
        cipher: KeyWrapCipher,
        store: Arc<dyn ContentStore>,
        tokens: Arc<dyn TokenMintService>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        let gate = AccessGate::new(metadata.clone());
        Self {
            cipher,
            store,
            tokens,
            metadata,
            gate,
            preview: PreviewGenerator,
        }
    }

    /// The gate used for download authorization.
    pub fn access_gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Names of the content store and token service backends.
    pub fn backends(&self) -> (&'static str, &'static str) {
        (self.store.backend_name(), self.tokens.backend_name())
    }

    /// Encrypt, store and mint a document.
    ///
    /// The caller persists the [`Document`] record; see
    /// [`publish_note`](Self::publish_note) for the variant that does.
    pub async fn publish(
        &self,
        author: &WalletAddress,
        plaintext: &[u8],
        price: Price,
    ) -> Result<PublishOutcome, PipelineError> {
        KeyWrapCipher::validate_format(plaintext)?;

        let envelope = self.cipher.encrypt(plaintext)?;
        let content_id = self.store.put(&envelope.to_bytes()).await?;
        tracing::info!(content_id = %content_id, size = plaintext.len(), "envelope stored");

        let token_id = match self.tokens.mint(author, price).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(content_id = %content_id, error = %e, "mint failed after envelope was stored");
                return Err(e.into());
            }
        };
        tracing::info!(content_id = %content_id, token_id = %token_id, "ownership token minted");

        Ok(PublishOutcome {
            content_id,
            token_id,
        })
    }

    /// Validate a publish request, run [`publish`](Self::publish), and
    /// persist the resulting [`Document`].
    pub async fn publish_note(
        &self,
        requester: &UserId,
        form: &PublishForm,
        upload: &FileUpload,
    ) -> Result<PublishedNote, PipelineError> {
        let listing = form.validate()?;
        upload.validate()?;

        let outcome = self
            .publish(&listing.author_address, &upload.bytes, listing.price)
            .await?;

        let document = Document {
            content_id: outcome.content_id.clone(),
            owner_id: requester.clone(),
            price: listing.price,
            token_id: outcome.token_id,
            name: listing.name,
            course_id: listing.course_id,
            description: listing.description,
            created_at: Utc::now(),
        };
        if let Err(e) = self.metadata.insert_document(document).await {
            tracing::error!(
                content_id = %outcome.content_id,
                token_id = %outcome.token_id,
                error = %e,
                "published note could not be recorded"
            );
            return Err(e.into());
        }

        tracing::info!(
            requester = %requester,
            content_id = %outcome.content_id,
            token_id = %outcome.token_id,
            "note published"
        );
        Ok(PublishedNote {
            content_id: outcome.content_id,
            token_id: outcome.token_id,
        })
    }

    /// Full plaintext, for the author or a purchaser.
    pub async fn retrieve_full(
        &self,
        requester: &UserId,
        content_id: &ContentId,
    ) -> Result<Vec<u8>, PipelineError> {
        if !self.gate.is_authorized(requester, content_id).await? {
            tracing::warn!(requester = %requester, content_id = %content_id, "download denied");
            return Err(PipelineError::Unauthorized);
        }
        let plaintext = self.open(content_id).await?;
        tracing::info!(requester = %requester, content_id = %content_id, "download served");
        Ok(plaintext)
    }

    /// Public preview. No authorization.
    pub async fn retrieve_preview(&self, content_id: &ContentId) -> Result<Vec<u8>, PipelineError> {
        let plaintext = self.open(content_id).await?;
        let preview = self.preview.derive(&plaintext)?;
        tracing::info!(content_id = %content_id, size = preview.len(), "preview served");
        Ok(preview)
    }

    /// Dispatch on `action`. Downloads need a requester.
    pub async fn retrieve(
        &self,
        requester: Option<&UserId>,
        content_id: &ContentId,
        action: RetrieveAction,
    ) -> Result<Vec<u8>, PipelineError> {
        match action {
            RetrieveAction::Preview => self.retrieve_preview(content_id).await,
            RetrieveAction::Download => match requester {
                Some(user) => self.retrieve_full(user, content_id).await,
                None => Err(PipelineError::Unauthorized),
            },
        }
    }

    /// Buy `content_id` at its listed price and record the purchase once
    /// the transaction is confirmed.
    pub async fn purchase(
        &self,
        buyer: &UserId,
        buyer_address: &WalletAddress,
        content_id: &ContentId,
    ) -> Result<PurchaseReceipt, PipelineError> {
        let document = self
            .metadata
            .document(content_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(content_id.to_string()))?;
        if self.gate.is_authorized(buyer, content_id).await? {
            return Err(PipelineError::AlreadyOwned(content_id.clone()));
        }

        let receipt = self
            .tokens
            .purchase(document.token_id, buyer_address, document.price)
            .await?;
        tracing::info!(
            buyer = %buyer,
            content_id = %content_id,
            token_id = %document.token_id,
            tx_hash = %receipt.tx_hash,
            "purchase confirmed"
        );

        if let Err(e) = self.gate.record_purchase(buyer, content_id).await {
            tracing::error!(
                buyer = %buyer,
                content_id = %content_id,
                tx_hash = %receipt.tx_hash,
                error = %e,
                "confirmed purchase could not be recorded"
            );
            return Err(e);
        }
        Ok(receipt)
    }

    async fn open(&self, content_id: &ContentId) -> Result<Vec<u8>, PipelineError> {
        let stored = self.store.get(content_id).await?;
        let envelope = EncryptionEnvelope::parse(&stored)?;
        Ok(self.cipher.decrypt(&envelope)?)
    }
}
