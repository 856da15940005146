//! # Filesystem Content Store
//!
//! Envelopes are stored as `{root}/{sha256_hex}.blob`. The filename is the
//! identifier, so it is recomputed and compared on every read; corruption
//! or tampering surfaces as [`StoreError::Integrity`].
//!
//! Writes go to a unique temporary file and are renamed into place, so a
//! reader never observes a partially written blob. Storing identical bytes
//! twice yields the same identifier and leaves one file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use notebox_core::ContentId;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;
use crate::ContentStore;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Directory-backed content-addressed [`ContentStore`].
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a blob with the given digest is stored at.
    pub fn blob_path(&self, digest_hex: &str) -> PathBuf {
        self.root.join(format!("{digest_hex}.blob"))
    }
}

fn is_digest_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId, StoreError> {
        let digest = hex::encode(Sha256::digest(bytes));
        let path = self.blob_path(&digest);

        if tokio::fs::try_exists(&path).await? {
            tracing::debug!(content_id = %digest, "blob already present");
        } else {
            tokio::fs::create_dir_all(&self.root).await?;
            let tmp = self.root.join(format!(
                ".{digest}.{}.{}.tmp",
                std::process::id(),
                TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
            ));
            let mut file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&tmp)
                .await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            if let Err(e) = tokio::fs::rename(&tmp, &path).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(e.into());
            }
            tracing::debug!(content_id = %digest, size = bytes.len(), "blob written");
        }

        ContentId::new(digest).map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }

    async fn get(&self, id: &ContentId) -> Result<Vec<u8>, StoreError> {
        let digest = id.as_str();
        if !is_digest_hex(digest) {
            return Err(StoreError::NotFound(digest.to_string()));
        }
        let bytes = match tokio::fs::read(self.blob_path(digest)).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(digest.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let recomputed = hex::encode(Sha256::digest(&bytes));
        if !bool::from(recomputed.as_bytes().ct_eq(digest.as_bytes())) {
            tracing::error!(content_id = %digest, "stored blob does not match its digest");
            return Err(StoreError::Integrity(digest.to_string()));
        }
        Ok(bytes)
    }

    fn backend_name(&self) -> &'static str {
        "fs"
    }
}
