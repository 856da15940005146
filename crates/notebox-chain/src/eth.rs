//! # Ethereum Token Service
//!
//! Drives the marketplace contract through a node-managed account:
//!
//! - `mint` sends `initializeToken(owner, SUPPLY_CAP, priceWei)` from the
//!   minter, waits for the receipt, and reads the token id from the
//!   contract's `mintEvent(uint256)` log in that receipt.
//! - `purchase` sends `purchase(tokenId)` from the buyer with
//!   `value = priceWei` and waits for the receipt.
//!
//! Submission happens exactly once. Every request carries the configured
//! RPC timeout, and a submission that stalls past it fails as
//! [`ChainError::Submission`]. Receipt polling is read-only and rides out
//! transport failures; the whole poll loop, including any in-flight
//! request, is bounded by the confirmation deadline.

use async_trait::async_trait;
use notebox_core::{Price, TokenId, WalletAddress};
use serde::Deserialize;
use serde_json::json;

use crate::abi;
use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::rpc::JsonRpcClient;
use crate::{PurchaseReceipt, TokenMintService};

/// Edition size passed to `initializeToken`.
pub const SUPPLY_CAP: u128 = 100_000_000;

const INITIALIZE_TOKEN: &str = "initializeToken(address,uint256,uint256)";
const PURCHASE: &str = "purchase(uint256)";
const MINT_EVENT: &str = "mintEvent(uint256)";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    transaction_hash: String,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    logs: Vec<Log>,
}

#[derive(Debug, Clone, Deserialize)]
struct Log {
    address: String,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    data: String,
}

/// [`TokenMintService`] over Ethereum JSON-RPC.
#[derive(Debug)]
pub struct EthTokenService {
    rpc: JsonRpcClient,
    config: ChainConfig,
    mint_topic: String,
}

impl EthTokenService {
    /// Create a service for the contract described by `config`.
    pub fn new(config: ChainConfig) -> Result<Self, ChainError> {
        let rpc = JsonRpcClient::new(config.rpc_url.as_str(), config.request_timeout)?;
        Ok(Self {
            rpc,
            config,
            mint_topic: abi::event_topic(MINT_EVENT),
        })
    }

    async fn submit(&self, tx: serde_json::Value) -> Result<String, ChainError> {
        self.rpc
            .call::<String>("eth_sendTransaction", json!([tx]))
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))
    }

    async fn await_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt, ChainError> {
        let deadline = self.config.confirmation_timeout;
        match tokio::time::timeout(deadline, self.poll_receipt(tx_hash)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(tx_hash, waited = ?deadline, "confirmation deadline passed");
                Err(ChainError::ConfirmationTimeout {
                    tx_hash: tx_hash.to_string(),
                    waited: deadline,
                })
            }
        }
    }

    async fn poll_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt, ChainError> {
        loop {
            match self
                .rpc
                .call::<Option<TransactionReceipt>>("eth_getTransactionReceipt", json!([tx_hash]))
                .await
            {
                Ok(Some(receipt)) if receipt.block_number.is_some() => return Ok(receipt),
                Ok(_) => {}
                Err(e) if e.is_transient() => {
                    tracing::warn!(tx_hash, error = %e, "receipt poll failed, will retry");
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    fn check_status(receipt: &TransactionReceipt) -> Result<(), ChainError> {
        match receipt.status.as_deref() {
            Some(status) if abi::parse_quantity(status)? == 0 => Err(ChainError::Reverted {
                tx_hash: receipt.transaction_hash.clone(),
                reason: "status 0x0".into(),
            }),
            _ => Ok(()),
        }
    }

    /// Token id from the contract's mint event in `receipt`.
    fn minted_token(&self, receipt: &TransactionReceipt) -> Result<TokenId, ChainError> {
        let contract = self.config.contract.as_str();
        let log = receipt
            .logs
            .iter()
            .find(|log| {
                log.address.eq_ignore_ascii_case(contract)
                    && log
                        .topics
                        .first()
                        .is_some_and(|t| t.eq_ignore_ascii_case(&self.mint_topic))
            })
            .ok_or_else(|| ChainError::EventMissing {
                tx_hash: receipt.transaction_hash.clone(),
            })?;

        let id = match log.topics.get(1) {
            Some(indexed) => abi::decode_uint_word(indexed)?,
            None => {
                let data = log.data.strip_prefix("0x").unwrap_or(&log.data);
                let first = data.get(..abi::WORD_LEN * 2).ok_or_else(|| {
                    ChainError::InvalidResponse("mint event data shorter than one word".into())
                })?;
                abi::decode_uint_word(first)?
            }
        };
        Ok(TokenId::new(id))
    }
}

#[async_trait]
impl TokenMintService for EthTokenService {
    async fn mint(&self, owner: &WalletAddress, price: Price) -> Result<TokenId, ChainError> {
        let data = abi::encode_call(
            INITIALIZE_TOKEN,
            &[
                abi::encode_address(owner)?,
                abi::encode_uint(SUPPLY_CAP),
                abi::encode_uint(price.to_base_units()),
            ],
        );
        let tx_hash = self
            .submit(json!({
                "from": self.config.minter.as_str(),
                "to": self.config.contract.as_str(),
                "data": data,
            }))
            .await?;
        tracing::info!(%tx_hash, owner = %owner, %price, "mint submitted");

        let receipt = self.await_receipt(&tx_hash).await?;
        Self::check_status(&receipt)?;
        let token_id = self.minted_token(&receipt)?;
        tracing::info!(%tx_hash, %token_id, "mint confirmed");
        Ok(token_id)
    }

    async fn purchase(
        &self,
        token_id: TokenId,
        buyer: &WalletAddress,
        price: Price,
    ) -> Result<PurchaseReceipt, ChainError> {
        let value_wei = price.to_base_units();
        let tx_hash = self
            .submit(json!({
                "from": buyer.as_str(),
                "to": self.config.contract.as_str(),
                "value": abi::to_quantity(value_wei),
                "data": abi::encode_call(PURCHASE, &[abi::encode_uint(token_id.value())]),
            }))
            .await?;
        tracing::info!(%tx_hash, %token_id, buyer = %buyer, "purchase submitted");

        let receipt = self.await_receipt(&tx_hash).await?;
        Self::check_status(&receipt)?;
        let block_number = receipt
            .block_number
            .as_deref()
            .map(abi::parse_quantity)
            .transpose()?
            .unwrap_or_default();
        let block_number = u64::try_from(block_number)
            .map_err(|_| ChainError::InvalidResponse("block number out of range".into()))?;

        tracing::info!(%tx_hash, %token_id, block_number, "purchase confirmed");
        Ok(PurchaseReceipt {
            tx_hash,
            block_number,
            token_id,
            buyer: buyer.clone(),
            value_wei,
        })
    }

    fn backend_name(&self) -> &'static str {
        "ethereum"
    }
}
