//! Storage backend configuration.
//!
//! Loaded once at start-up from environment variables. Tests build configs
//! directly or through [`StoreConfig::from_lookup`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::StoreError;
use crate::{ContentStore, FsContentStore, IpfsContentStore, MemoryContentStore};

/// Connection settings for a Kubo node.
#[derive(Debug, Clone)]
pub struct IpfsConfig {
    /// Base URL of the node's RPC API.
    /// Default: <http://127.0.0.1:5001>
    pub api_url: Url,
    /// Client-side deadline for one whole `put` or `get`.
    pub timeout: Duration,
    /// Node-side resolution deadline passed to `cat`.
    pub resolve_timeout: Duration,
    /// Maximum concurrent sessions.
    pub max_sessions: usize,
}

impl IpfsConfig {
    /// Configuration for a node at `api_url` with default limits.
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            timeout: Duration::from_secs(30),
            resolve_timeout: Duration::from_secs(20),
            max_sessions: 8,
        }
    }
}

/// Which [`ContentStore`] implementation to run.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// Kubo node.
    Ipfs(IpfsConfig),
    /// Filesystem CAS rooted at the path.
    Fs(PathBuf),
    /// Process-local map.
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Selected backend.
    pub backend: StoreBackend,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `NOTEBOX_STORE`: `ipfs` (default), `fs`, or `memory`
    /// - `IPFS_API_URL` (default: `http://127.0.0.1:5001`)
    /// - `IPFS_TIMEOUT_SECS` (default: 30)
    /// - `IPFS_RESOLVE_TIMEOUT_SECS` (default: 20)
    /// - `IPFS_MAX_SESSIONS` (default: 8)
    /// - `NOTEBOX_STORE_DIR` (required for `fs`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = lookup("NOTEBOX_STORE").unwrap_or_else(|| "ipfs".to_string());
        let backend = match kind.trim().to_ascii_lowercase().as_str() {
            "ipfs" => {
                let raw = lookup("IPFS_API_URL").unwrap_or_else(|| "http://127.0.0.1:5001".into());
                let api_url = Url::parse(&raw)
                    .map_err(|e| ConfigError::InvalidUrl("IPFS_API_URL".into(), e.to_string()))?;
                let defaults = IpfsConfig::new(api_url);
                StoreBackend::Ipfs(IpfsConfig {
                    timeout: secs(&lookup, "IPFS_TIMEOUT_SECS").unwrap_or(defaults.timeout),
                    resolve_timeout: secs(&lookup, "IPFS_RESOLVE_TIMEOUT_SECS")
                        .unwrap_or(defaults.resolve_timeout),
                    max_sessions: lookup("IPFS_MAX_SESSIONS")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(defaults.max_sessions),
                    ..defaults
                })
            }
            "fs" => {
                let dir = lookup("NOTEBOX_STORE_DIR").ok_or(ConfigError::MissingVar("NOTEBOX_STORE_DIR"))?;
                StoreBackend::Fs(PathBuf::from(dir))
            }
            "memory" => StoreBackend::Memory,
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };
        Ok(Self { backend })
    }

    /// Construct the configured store.
    pub fn build(&self) -> Result<Arc<dyn ContentStore>, StoreError> {
        Ok(match &self.backend {
            StoreBackend::Ipfs(cfg) => Arc::new(IpfsContentStore::new(cfg.clone())?),
            StoreBackend::Fs(root) => Arc::new(FsContentStore::new(root.clone())),
            StoreBackend::Memory => Arc::new(MemoryContentStore::new()),
        })
    }
}

fn secs<F: Fn(&str) -> Option<String>>(lookup: &F, var: &str) -> Option<Duration> {
    lookup(var)
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is absent.
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),
    /// `NOTEBOX_STORE` names no known backend.
    #[error("unknown storage backend {0:?} (expected ipfs, fs or memory)")]
    UnknownBackend(String),
    /// A URL variable does not parse.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_to_local_ipfs() {
        let cfg = StoreConfig::from_lookup(lookup(&[])).unwrap();
        match cfg.backend {
            StoreBackend::Ipfs(ipfs) => {
                assert_eq!(ipfs.api_url.as_str(), "http://127.0.0.1:5001/");
                assert_eq!(ipfs.timeout, Duration::from_secs(30));
                assert_eq!(ipfs.resolve_timeout, Duration::from_secs(20));
                assert_eq!(ipfs.max_sessions, 8);
            }
            other => panic!("expected ipfs backend, got {other:?}"),
        }
    }

    #[test]
    fn ipfs_overrides_apply() {
        let cfg = StoreConfig::from_lookup(lookup(&[
            ("IPFS_API_URL", "http://ipfs.internal:5001"),
            ("IPFS_TIMEOUT_SECS", "5"),
            ("IPFS_MAX_SESSIONS", "2"),
        ]))
        .unwrap();
        let StoreBackend::Ipfs(ipfs) = cfg.backend else {
            panic!("expected ipfs backend");
        };
        assert_eq!(ipfs.api_url.host_str(), Some("ipfs.internal"));
        assert_eq!(ipfs.timeout, Duration::from_secs(5));
        assert_eq!(ipfs.max_sessions, 2);
    }

    #[test]
    fn fs_requires_directory() {
        let err = StoreConfig::from_lookup(lookup(&[("NOTEBOX_STORE", "fs")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("NOTEBOX_STORE_DIR")));

        let cfg = StoreConfig::from_lookup(lookup(&[
            ("NOTEBOX_STORE", "fs"),
            ("NOTEBOX_STORE_DIR", "/var/lib/notebox"),
        ]))
        .unwrap();
        assert!(matches!(cfg.backend, StoreBackend::Fs(ref p) if p == &PathBuf::from("/var/lib/notebox")));
    }

    #[test]
    fn rejects_unknown_backend_and_bad_url() {
        assert!(matches!(
            StoreConfig::from_lookup(lookup(&[("NOTEBOX_STORE", "s3")])),
            Err(ConfigError::UnknownBackend(_))
        ));
        assert!(matches!(
            StoreConfig::from_lookup(lookup(&[("IPFS_API_URL", "not a url")])),
            Err(ConfigError::InvalidUrl(..))
        ));
    }

    #[test]
    fn memory_backend_builds() {
        let cfg = StoreConfig::from_lookup(lookup(&[("NOTEBOX_STORE", "memory")])).unwrap();
        assert_eq!(cfg.build().unwrap().backend_name(), "memory");
    }
}
