//! # notebox-chain — Ownership Tokens
//!
//! Mints one ownership token per published note and settles purchases
//! against it. [`TokenMintService`] is the seam; [`EthTokenService`] talks
//! to a marketplace contract over JSON-RPC and [`InMemoryTokenLedger`]
//! stands in for tests and local development.
//!
//! ## Confirmation
//!
//! A mint is complete only when its own transaction receipt is confirmed and
//! carries the contract's `mintEvent`. The token id comes from that event,
//! never from a scan of recent blocks.

pub mod abi;
pub mod config;
pub mod error;
pub mod eth;
pub mod memory;
pub mod rpc;

use async_trait::async_trait;
use notebox_core::{Price, TokenId, WalletAddress};
use serde::{Serialize, Serializer};

pub use config::{ChainBackend, ChainConfig, ConfigError};
pub use error::ChainError;
pub use eth::{EthTokenService, SUPPLY_CAP};
pub use memory::{FailureMode, InMemoryTokenLedger};

/// Confirmed purchase transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    /// Transaction hash.
    pub tx_hash: String,
    /// Block the transaction was mined in.
    pub block_number: u64,
    /// Token bought.
    pub token_id: TokenId,
    /// Paying account.
    pub buyer: WalletAddress,
    /// Amount paid, in wei.
    #[serde(serialize_with = "as_decimal_string")]
    pub value_wei: u128,
}

fn as_decimal_string<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Ownership-token operations on the settlement chain.
#[async_trait]
pub trait TokenMintService: Send + Sync {
    /// Mint a token owned by `owner` at `price`, returning its id once the
    /// mint is confirmed.
    async fn mint(&self, owner: &WalletAddress, price: Price) -> Result<TokenId, ChainError>;

    /// Pay `price` from `buyer` for `token_id` and wait for confirmation.
    async fn purchase(
        &self,
        token_id: TokenId,
        buyer: &WalletAddress,
        price: Price,
    ) -> Result<PurchaseReceipt, ChainError>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}
