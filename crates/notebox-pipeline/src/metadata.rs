//! # Metadata Store
//!
//! Document and purchase records live in an external store. The pipeline
//! reaches it only through [`MetadataStore`]; [`InMemoryMetadataStore`] is
//! the DashMap-backed implementation used by tests and single-process
//! deployments.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use notebox_core::{ContentId, Document, PurchaseRecord, UserId};

/// Errors from a [`MetadataStore`].
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// A document with this content id already exists.
    #[error("document {0} already exists")]
    Duplicate(ContentId),

    /// The backing store failed.
    #[error("metadata backend error: {0}")]
    Backend(String),
}

/// Persistence for [`Document`] and [`PurchaseRecord`].
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Persist a newly published document.
    async fn insert_document(&self, document: Document) -> Result<(), MetadataError>;

    /// Look up a document by content id.
    async fn document(&self, content_id: &ContentId) -> Result<Option<Document>, MetadataError>;

    /// Whether `user` has a purchase record for `content_id`.
    async fn has_purchase(&self, user: &UserId, content_id: &ContentId) -> Result<bool, MetadataError>;

    /// Persist a purchase. Returns `false` if one already existed.
    async fn insert_purchase(&self, record: PurchaseRecord) -> Result<bool, MetadataError>;

    /// All purchases made by `user`.
    async fn purchases_of(&self, user: &UserId) -> Result<Vec<PurchaseRecord>, MetadataError>;
}

/// In-memory [`MetadataStore`].
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    documents: DashMap<ContentId, Document>,
    purchases: DashMap<(UserId, ContentId), PurchaseRecord>,
    unavailable: AtomicBool,
}

impl InMemoryMetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a backend error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored documents.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Number of stored purchases.
    pub fn purchase_count(&self) -> usize {
        self.purchases.len()
    }

    fn check(&self) -> Result<(), MetadataError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(MetadataError::Backend("store marked unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn insert_document(&self, document: Document) -> Result<(), MetadataError> {
        self.check()?;
        match self.documents.entry(document.content_id.clone()) {
            Entry::Occupied(_) => Err(MetadataError::Duplicate(document.content_id)),
            Entry::Vacant(slot) => {
                slot.insert(document);
                Ok(())
            }
        }
    }

    async fn document(&self, content_id: &ContentId) -> Result<Option<Document>, MetadataError> {
        self.check()?;
        Ok(self.documents.get(content_id).map(|d| d.value().clone()))
    }

    async fn has_purchase(&self, user: &UserId, content_id: &ContentId) -> Result<bool, MetadataError> {
        self.check()?;
        Ok(self
            .purchases
            .contains_key(&(user.clone(), content_id.clone())))
    }

    async fn insert_purchase(&self, record: PurchaseRecord) -> Result<bool, MetadataError> {
        self.check()?;
        let key = (record.user_id.clone(), record.content_id.clone());
        match self.purchases.entry(key) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    async fn purchases_of(&self, user: &UserId) -> Result<Vec<PurchaseRecord>, MetadataError> {
        self.check()?;
        let mut records: Vec<PurchaseRecord> = self
            .purchases
            .iter()
            .filter(|entry| &entry.key().0 == user)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(records)
    }
}
