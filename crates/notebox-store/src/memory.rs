//! In-memory content store for tests and local development.
//!
//! Identifiers are the SHA-256 hex of the stored bytes. Call counters and an
//! outage switch let tests assert which storage calls a flow made.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use notebox_core::ContentId;
use sha2::{Digest, Sha256};

use crate::error::StoreError;
use crate::ContentStore;

/// DashMap-backed [`ContentStore`].
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    blobs: DashMap<String, Vec<u8>>,
    puts: AtomicUsize,
    gets: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put` calls made, successful or not.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of `get` calls made, successful or not.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Make every subsequent call fail with a transport error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Raw stored bytes, bypassing counters.
    pub fn raw(&self, id: &ContentId) -> Option<Vec<u8>> {
        self.blobs.get(id.as_str()).map(|b| b.value().clone())
    }

    fn check_available(&self, operation: &'static str) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Transport {
                operation,
                reason: "store marked unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId, StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check_available("put")?;
        let digest = hex::encode(Sha256::digest(bytes));
        self.blobs
            .entry(digest.clone())
            .or_insert_with(|| bytes.to_vec());
        ContentId::new(digest).map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }

    async fn get(&self, id: &ContentId) -> Result<Vec<u8>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_available("get")?;
        self.raw(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn roundtrip_and_counters() {
        let store = MemoryContentStore::new();
        let id = store.put(b"envelope").await.unwrap();
        assert_eq!(store.get(&id).await.unwrap(), b"envelope");
        assert_eq!(store.put_count(), 1);
        assert_eq!(store.get_count(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = MemoryContentStore::new();
        let id = ContentId::new("QmNothingHere").unwrap();
        assert!(store.get(&id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn outage_fails_calls() {
        let store = MemoryContentStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.put(b"x").await,
            Err(StoreError::Transport { operation: "put", .. })
        ));
        assert!(store.is_empty());
        store.set_unavailable(false);
        assert!(store.put(b"x").await.is_ok());
    }
}
