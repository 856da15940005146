//! Chain backend configuration.

use std::sync::Arc;
use std::time::Duration;

use notebox_core::WalletAddress;
use url::Url;

use crate::error::ChainError;
use crate::{EthTokenService, InMemoryTokenLedger, TokenMintService};

/// Settings for the Ethereum JSON-RPC backend.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Node RPC endpoint. Default: <http://127.0.0.1:8545>
    pub rpc_url: Url,
    /// Marketplace contract.
    pub contract: WalletAddress,
    /// Node-managed account that submits mint transactions.
    pub minter: WalletAddress,
    /// How long to wait for a receipt.
    pub confirmation_timeout: Duration,
    /// Delay between receipt polls.
    pub poll_interval: Duration,
    /// Deadline for a single JSON-RPC request.
    pub request_timeout: Duration,
}

impl ChainConfig {
    /// Configuration with default timing.
    pub fn new(rpc_url: Url, contract: WalletAddress, minter: WalletAddress) -> Self {
        Self {
            rpc_url,
            contract,
            minter,
            confirmation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Which [`TokenMintService`] to run.
#[derive(Debug, Clone)]
pub enum ChainBackend {
    /// Ethereum node over JSON-RPC.
    Ethereum(ChainConfig),
    /// Process-local ledger.
    Memory,
}

impl ChainBackend {
    /// Load from environment variables.
    ///
    /// Variables:
    /// - `NOTEBOX_CHAIN`: `memory` selects the in-memory ledger
    /// - `ETH_RPC_URL` (default: `http://127.0.0.1:8545`)
    /// - `NOTEBOX_CONTRACT_ADDRESS` (required)
    /// - `NOTEBOX_MINTER_ADDRESS` (required)
    /// - `ETH_CONFIRMATION_TIMEOUT_SECS` (default: 120)
    /// - `ETH_POLL_INTERVAL_MS` (default: 1000)
    /// - `ETH_RPC_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if lookup("NOTEBOX_CHAIN").is_some_and(|v| v.trim().eq_ignore_ascii_case("memory")) {
            return Ok(Self::Memory);
        }

        let raw_url = lookup("ETH_RPC_URL").unwrap_or_else(|| "http://127.0.0.1:8545".into());
        let rpc_url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidUrl("ETH_RPC_URL".into(), e.to_string()))?;
        let contract = address(&lookup, "NOTEBOX_CONTRACT_ADDRESS")?;
        let minter = address(&lookup, "NOTEBOX_MINTER_ADDRESS")?;

        let mut config = ChainConfig::new(rpc_url, contract, minter);
        if let Some(secs) = lookup("ETH_CONFIRMATION_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            config.confirmation_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = lookup("ETH_POLL_INTERVAL_MS").and_then(|s| s.parse().ok()) {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = lookup("ETH_RPC_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(Self::Ethereum(config))
    }

    /// Construct the configured service.
    pub fn build(&self) -> Result<Arc<dyn TokenMintService>, ChainError> {
        Ok(match self {
            Self::Ethereum(cfg) => Arc::new(EthTokenService::new(cfg.clone())?),
            Self::Memory => Arc::new(InMemoryTokenLedger::new()),
        })
    }
}

fn address<F: Fn(&str) -> Option<String>>(
    lookup: &F,
    var: &'static str,
) -> Result<WalletAddress, ConfigError> {
    let raw = lookup(var).ok_or(ConfigError::MissingVar(var))?;
    WalletAddress::new(raw.trim()).map_err(|e| ConfigError::InvalidAddress(var, e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is absent.
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),
    /// An address variable is malformed.
    #[error("invalid address in {0}: {1}")]
    InvalidAddress(&'static str, String),
    /// A URL variable does not parse.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
