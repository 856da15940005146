//! # IPFS Content Store
//!
//! Stores envelopes on a Kubo node through its HTTP RPC:
//!
//! - `put` → `POST /api/v0/add?pin=true&cid-version=0` (multipart, one file)
//! - `get` → `POST /api/v0/cat?arg=<cid>&timeout=<resolve>s`
//!
//! ## Deadlines
//!
//! Each call is wrapped in a client-side `tokio::time::timeout`; expiry is
//! [`StoreError::Timeout`]. The node is also told to stop resolving after
//! `resolve_timeout`, and its "deadline exceeded" answer is a
//! [`StoreError::NotFound`], since the object could not be located.
//!
//! ## Retry
//!
//! `cat` is read-only and retries connection failures with backoff. `add` is
//! sent once.

use std::future::Future;

use async_trait::async_trait;
use notebox_core::ContentId;
use serde::Deserialize;

use crate::config::IpfsConfig;
use crate::error::StoreError;
use crate::retry::READ_BACKOFF;
use crate::session::SessionPool;
use crate::ContentStore;

/// Kubo-backed [`ContentStore`].
#[derive(Debug, Clone)]
pub struct IpfsContentStore {
    client: reqwest::Client,
    config: IpfsConfig,
    sessions: SessionPool,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

#[derive(Debug, Deserialize)]
struct KuboError {
    #[serde(rename = "Message", default)]
    message: String,
}

impl IpfsContentStore {
    /// Create a store for the node described by `config`.
    pub fn new(config: IpfsConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| StoreError::Transport {
                operation: "init",
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        let sessions = SessionPool::new(config.max_sessions);
        Ok(Self {
            client,
            config,
            sessions,
        })
    }

    /// The session pool bounding concurrent calls.
    pub fn sessions(&self) -> &SessionPool {
        &self.sessions
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v0/{path}", self.config.api_url.as_str().trim_end_matches('/'))
    }

    async fn with_deadline<T, Fut>(&self, operation: &'static str, fut: Fut) -> Result<T, StoreError>
    where
        Fut: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.config.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, timeout = ?self.config.timeout, "storage call exceeded deadline");
                Err(StoreError::Timeout {
                    operation,
                    elapsed: self.config.timeout,
                })
            }
        }
    }

    async fn add(&self, bytes: &[u8]) -> Result<ContentId, StoreError> {
        let _session = self.sessions.acquire("put").await?;
        let part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name("envelope")
            .mime_str("application/octet-stream")
            .map_err(|e| StoreError::Transport {
                operation: "put",
                reason: e.to_string(),
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .client
            .post(self.endpoint("add"))
            .query(&[("pin", "true"), ("cid-version", "0")])
            .multipart(form)
            .send()
            .await
            .map_err(|e| StoreError::Transport {
                operation: "put",
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| StoreError::Transport {
            operation: "put",
            reason: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(StoreError::Upstream {
                operation: "put",
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        // Kubo streams one JSON object per line; the last names the root.
        let line = body
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| StoreError::InvalidResponse("empty add response".into()))?;
        let added: AddResponse = serde_json::from_str(line)
            .map_err(|e| StoreError::InvalidResponse(format!("add response: {e}")))?;
        ContentId::new(added.hash)
            .map_err(|e| StoreError::InvalidResponse(format!("add returned an unusable CID: {e}")))
    }

    async fn cat(&self, id: &ContentId) -> Result<Vec<u8>, StoreError> {
        let _session = self.sessions.acquire("get").await?;
        let url = self.endpoint("cat");
        let resolve = format!("{}s", self.config.resolve_timeout.as_secs().max(1));

        let resp = READ_BACKOFF
            .send("get", || {
                self.client
                    .post(&url)
                    .query(&[("arg", id.as_str()), ("timeout", resolve.as_str())])
                    .send()
            })
            .await
        .map_err(|e| StoreError::Transport {
            operation: "get",
            reason: e.to_string(),
        })?;

        let status = resp.status();
        if status.is_success() {
            let bytes = resp.bytes().await.map_err(|e| StoreError::Transport {
                operation: "get",
                reason: e.to_string(),
            })?;
            return Ok(bytes.to_vec());
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<KuboError>(&body)
            .map(|e| e.message)
            .unwrap_or_else(|_| body.clone());
        if status.is_client_error() || is_unresolvable(&message) {
            tracing::debug!(content_id = %id, %status, "node could not resolve content");
            return Err(StoreError::NotFound(id.to_string()));
        }
        Err(StoreError::Upstream {
            operation: "get",
            status: status.as_u16(),
            body: excerpt(&message),
        })
    }
}

#[async_trait]
impl ContentStore for IpfsContentStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId, StoreError> {
        let id = self.with_deadline("put", self.add(bytes)).await?;
        tracing::info!(content_id = %id, size = bytes.len(), "envelope pinned");
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> Result<Vec<u8>, StoreError> {
        let bytes = self.with_deadline("get", self.cat(id)).await?;
        tracing::debug!(content_id = %id, size = bytes.len(), "envelope fetched");
        Ok(bytes)
    }

    fn backend_name(&self) -> &'static str {
        "ipfs"
    }
}

/// Kubo error messages that mean the object could not be located.
fn is_unresolvable(message: &str) -> bool {
    let m = message.to_ascii_lowercase();
    ["deadline exceeded", "not found", "invalid cid", "invalid path", "no link named"]
        .iter()
        .any(|needle| m.contains(needle))
}

fn excerpt(body: &str) -> String {
    body.chars().take(256).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolvable_messages() {
        assert!(is_unresolvable("context deadline exceeded"));
        assert!(is_unresolvable("block was not found locally (offline): ipld: could not find QmX"));
        assert!(is_unresolvable("invalid path \"Qm\": invalid cid"));
        assert!(!is_unresolvable("internal server error"));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let store = IpfsContentStore::new(IpfsConfig::new(
            url::Url::parse("http://127.0.0.1:5001/").unwrap(),
        ))
        .unwrap();
        assert_eq!(store.endpoint("cat"), "http://127.0.0.1:5001/api/v0/cat");
    }

    #[test]
    fn excerpt_truncates() {
        assert_eq!(excerpt(&"x".repeat(1000)).len(), 256);
    }
}
