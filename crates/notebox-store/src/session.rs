//! # IPFS Sessions
//!
//! A [`SessionPool`] bounds how many storage calls may be in flight at once.
//! Each call holds an [`IpfsSession`] for its whole duration. The session
//! owns a semaphore permit, so it is returned to the pool when the guard is
//! dropped: on success, on error, on deadline expiry, and when the calling
//! future is cancelled.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::StoreError;

/// Bounded pool of storage sessions.
#[derive(Debug, Clone)]
pub struct SessionPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl SessionPool {
    /// Create a pool allowing `capacity` concurrent sessions (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free session.
    pub async fn acquire(&self, operation: &'static str) -> Result<IpfsSession, StoreError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| StoreError::Transport {
                operation,
                reason: "session pool closed".into(),
            })?;
        tracing::trace!(operation, "storage session opened");
        Ok(IpfsSession {
            operation,
            _permit: permit,
        })
    }

    /// Maximum concurrent sessions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sessions currently held.
    pub fn in_use(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }
}

/// A held storage session. Dropping it releases the slot.
#[derive(Debug)]
pub struct IpfsSession {
    operation: &'static str,
    _permit: OwnedSemaphorePermit,
}

impl IpfsSession {
    /// Operation this session was opened for.
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl Drop for IpfsSession {
    fn drop(&mut self) {
        tracing::trace!(operation = self.operation, "storage session closed");
    }
}
