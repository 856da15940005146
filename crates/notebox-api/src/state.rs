//! # Application State
//!
//! Shared state for the Axum application: the document pipeline and the
//! session provider. Built once at start-up from [`AppConfig`].

use std::sync::Arc;

use notebox_chain::{ChainBackend, ChainError};
use notebox_crypto::{CryptoError, KeyWrapCipher, MasterKey};
use notebox_pipeline::{DocumentPipeline, InMemoryMetadataStore};
use notebox_store::{StoreConfig, StoreError};
use thiserror::Error;

use crate::auth::{AuthConfigError, SessionProvider};

/// Errors building the application at start-up.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("master key: {0}")]
    MasterKey(#[from] CryptoError),

    #[error("storage configuration: {0}")]
    StoreConfig(#[from] notebox_store::ConfigError),

    #[error("storage backend: {0}")]
    Store(#[from] StoreError),

    #[error("chain configuration: {0}")]
    ChainConfig(#[from] notebox_chain::ConfigError),

    #[error("chain backend: {0}")]
    Chain(#[from] ChainError),

    #[error("sessions: {0}")]
    Sessions(#[from] AuthConfigError),

    #[error("invalid PORT {0:?}")]
    InvalidPort(String),
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen port. Default: 8080.
    pub port: u16,
    /// Content store selection.
    pub store: StoreConfig,
    /// Token service selection.
    pub chain: ChainBackend,
}

impl AppConfig {
    /// Load from environment variables. See [`StoreConfig::from_env`] and
    /// [`ChainBackend::from_env`] for the backend variables.
    pub fn from_env() -> Result<Self, StartupError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StartupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| StartupError::InvalidPort(raw))?,
            None => 8080,
        };
        Ok(Self {
            port,
            store: StoreConfig::from_lookup(&lookup)?,
            chain: ChainBackend::from_lookup(&lookup)?,
        })
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// The content pipeline.
    pub pipeline: DocumentPipeline,
    /// Bearer token resolution.
    pub sessions: Arc<dyn SessionProvider>,
}

impl AppState {
    /// Wrap already-built collaborators.
    pub fn new(pipeline: DocumentPipeline, sessions: Arc<dyn SessionProvider>) -> Self {
        Self { pipeline, sessions }
    }

    /// Build the pipeline from configuration.
    ///
    /// Document metadata is held in process memory.
    pub fn from_config(
        config: &AppConfig,
        master_key: MasterKey,
        sessions: Arc<dyn SessionProvider>,
    ) -> Result<Self, StartupError> {
        let store = config.store.build()?;
        let tokens = config.chain.build()?;
        tracing::info!(
            store = store.backend_name(),
            chain = tokens.backend_name(),
            "backends configured"
        );
        let pipeline = DocumentPipeline::new(
            KeyWrapCipher::new(master_key),
            store,
            tokens,
            Arc::new(InMemoryMetadataStore::new()),
        );
        Ok(Self::new(pipeline, sessions))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
