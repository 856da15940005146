//! # notebox-store — Content-Addressed Envelope Storage
//!
//! Persists encrypted envelopes as opaque blobs and returns the identifier
//! the storage layer assigns. Plaintext never reaches this crate.
//!
//! ## Backends
//!
//! - [`IpfsContentStore`]: a Kubo node's HTTP RPC. Every call holds an
//!   [`IpfsSession`] for its whole duration and is bounded by a client-side
//!   deadline.
//! - [`FsContentStore`]: `<root>/<sha256>.blob`, digest verified on read.
//! - [`MemoryContentStore`]: in-process map with call counters, used by
//!   tests and local development.
//!
//! [`StoreConfig::from_env`] selects a backend from `NOTEBOX_STORE`.
//!
//! ## Error Model
//!
//! A missing object and an unresolvable one are [`StoreError::NotFound`]; a
//! call that exceeded its deadline is [`StoreError::Timeout`]. The two are
//! never conflated.

pub mod config;
pub mod error;
pub mod fs;
pub mod ipfs;
pub mod memory;
pub(crate) mod retry;
pub mod session;

use async_trait::async_trait;
use notebox_core::ContentId;

pub use config::{ConfigError, IpfsConfig, StoreBackend, StoreConfig};
pub use error::StoreError;
pub use fs::FsContentStore;
pub use ipfs::IpfsContentStore;
pub use memory::MemoryContentStore;
pub use session::{IpfsSession, SessionPool};

/// Opaque blob storage keyed by a store-assigned [`ContentId`].
///
/// Implementations must be `Send + Sync` so one instance can be shared via
/// `Arc<dyn ContentStore>` across request handlers.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Persist `bytes` and return their identifier.
    async fn put(&self, bytes: &[u8]) -> Result<ContentId, StoreError>;

    /// Fetch the exact bytes previously stored under `id`.
    async fn get(&self, id: &ContentId) -> Result<Vec<u8>, StoreError>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}
