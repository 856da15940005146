//! # In-Memory Token Ledger
//!
//! A process-local stand-in for the marketplace contract. Token ids are
//! sequential from 1; each purchase must pay exactly the listed price.
//! Tests can count calls and force any chain failure mode.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use notebox_core::{OwnershipToken, Price, TokenId, WalletAddress};
use parking_lot::Mutex;

use crate::error::ChainError;
use crate::eth::SUPPLY_CAP;
use crate::{PurchaseReceipt, TokenMintService};

/// Failure to inject into the next ledger calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Transaction never accepted.
    Submission,
    /// Accepted but never confirmed.
    ConfirmationTimeout,
    /// Mined with failure status.
    Reverted,
    /// Mined without a mint event.
    EventMissing,
}

#[derive(Debug, Clone)]
struct TokenEntry {
    owner: WalletAddress,
    price_wei: u128,
    sold: u128,
}

/// DashMap-backed [`TokenMintService`].
#[derive(Debug)]
pub struct InMemoryTokenLedger {
    tokens: DashMap<u128, TokenEntry>,
    next_token: AtomicU64,
    block: AtomicU64,
    mints: AtomicUsize,
    purchases: AtomicUsize,
    mint_failure: Mutex<Option<FailureMode>>,
    purchase_failure: Mutex<Option<FailureMode>>,
}

impl Default for InMemoryTokenLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTokenLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            tokens: DashMap::new(),
            next_token: AtomicU64::new(1),
            block: AtomicU64::new(0),
            mints: AtomicUsize::new(0),
            purchases: AtomicUsize::new(0),
            mint_failure: Mutex::new(None),
            purchase_failure: Mutex::new(None),
        }
    }

    /// Make mints fail with `mode` until cleared with `None`.
    pub fn set_mint_failure(&self, mode: Option<FailureMode>) {
        *self.mint_failure.lock() = mode;
    }

    /// Make purchases fail with `mode` until cleared with `None`.
    pub fn set_purchase_failure(&self, mode: Option<FailureMode>) {
        *self.purchase_failure.lock() = mode;
    }

    /// Number of `mint` calls, successful or not.
    pub fn mint_count(&self) -> usize {
        self.mints.load(Ordering::SeqCst)
    }

    /// Number of `purchase` calls, successful or not.
    pub fn purchase_count(&self) -> usize {
        self.purchases.load(Ordering::SeqCst)
    }

    /// Current state of a minted token.
    pub fn token(&self, id: TokenId) -> Option<OwnershipToken> {
        self.tokens.get(&id.value()).map(|entry| OwnershipToken {
            token_id: id,
            owner_address: entry.owner.clone(),
            price_in_base_units: entry.price_wei,
        })
    }

    /// Copies sold of a token.
    pub fn sold(&self, id: TokenId) -> u128 {
        self.tokens.get(&id.value()).map(|e| e.sold).unwrap_or(0)
    }

    fn next_tx(&self) -> (String, u64) {
        let block = self.block.fetch_add(1, Ordering::SeqCst) + 1;
        (format!("0x{block:064x}"), block)
    }

    fn injected(mode: FailureMode, tx_hash: String) -> ChainError {
        match mode {
            FailureMode::Submission => ChainError::Submission("injected submission failure".into()),
            FailureMode::ConfirmationTimeout => ChainError::ConfirmationTimeout {
                tx_hash,
                waited: Duration::ZERO,
            },
            FailureMode::Reverted => ChainError::Reverted {
                tx_hash,
                reason: "injected revert".into(),
            },
            FailureMode::EventMissing => ChainError::EventMissing { tx_hash },
        }
    }
}

#[async_trait]
impl TokenMintService for InMemoryTokenLedger {
    async fn mint(&self, owner: &WalletAddress, price: Price) -> Result<TokenId, ChainError> {
        self.mints.fetch_add(1, Ordering::SeqCst);
        let failure = *self.mint_failure.lock();
        if let Some(mode) = failure {
            let (tx_hash, _) = self.next_tx();
            return Err(Self::injected(mode, tx_hash));
        }

        let id = u128::from(self.next_token.fetch_add(1, Ordering::SeqCst));
        self.tokens.insert(
            id,
            TokenEntry {
                owner: owner.clone(),
                price_wei: price.to_base_units(),
                sold: 0,
            },
        );
        let (tx_hash, _) = self.next_tx();
        tracing::debug!(%tx_hash, token_id = id, owner = %owner, "token minted in memory");
        Ok(TokenId::new(id))
    }

    async fn purchase(
        &self,
        token_id: TokenId,
        buyer: &WalletAddress,
        price: Price,
    ) -> Result<PurchaseReceipt, ChainError> {
        self.purchases.fetch_add(1, Ordering::SeqCst);
        let (tx_hash, block_number) = self.next_tx();
        let failure = *self.purchase_failure.lock();
        if let Some(mode) = failure {
            return Err(Self::injected(mode, tx_hash));
        }

        let value_wei = price.to_base_units();
        let mut entry = self
            .tokens
            .get_mut(&token_id.value())
            .ok_or_else(|| ChainError::Reverted {
                tx_hash: tx_hash.clone(),
                reason: format!("unknown token {token_id}"),
            })?;
        if entry.price_wei != value_wei {
            return Err(ChainError::Reverted {
                tx_hash,
                reason: format!("value {value_wei} does not match price {}", entry.price_wei),
            });
        }
        if entry.sold >= SUPPLY_CAP {
            return Err(ChainError::Reverted {
                tx_hash,
                reason: "supply exhausted".into(),
            });
        }
        entry.sold += 1;
        drop(entry);

        Ok(PurchaseReceipt {
            tx_hash,
            block_number,
            token_id,
            buyer: buyer.clone(),
            value_wei,
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(c: char) -> WalletAddress {
        WalletAddress::new(format!("0x{}", c.to_string().repeat(40))).unwrap()
    }

    #[tokio::test]
    async fn mints_sequential_ids() {
        let ledger = InMemoryTokenLedger::new();
        let price = Price::parse("1.5").unwrap();
        let a = ledger.mint(&addr('a'), price).await.unwrap();
        let b = ledger.mint(&addr('b'), price).await.unwrap();
        assert_eq!(a, TokenId::new(1));
        assert_eq!(b, TokenId::new(2));
        let token = ledger.token(a).unwrap();
        assert_eq!(token.owner_address, addr('a'));
        assert_eq!(token.price_in_base_units, 1_500_000_000_000_000_000);
        assert_eq!(ledger.mint_count(), 2);
    }

    #[tokio::test]
    async fn purchase_requires_exact_price() {
        let ledger = InMemoryTokenLedger::new();
        let id = ledger.mint(&addr('a'), Price::parse("2").unwrap()).await.unwrap();

        let err = ledger
            .purchase(id, &addr('b'), Price::parse("1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Reverted { .. }));

        let receipt = ledger
            .purchase(id, &addr('b'), Price::parse("2").unwrap())
            .await
            .unwrap();
        assert_eq!(receipt.token_id, id);
        assert_eq!(receipt.value_wei, 2_000_000_000_000_000_000);
        assert_eq!(ledger.sold(id), 1);
    }

    #[tokio::test]
    async fn purchase_of_unknown_token_reverts() {
        let ledger = InMemoryTokenLedger::new();
        let err = ledger
            .purchase(TokenId::new(99), &addr('b'), Price::parse("1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Reverted { .. }));
    }

    #[tokio::test]
    async fn injected_failures_surface_as_distinct_errors() {
        let ledger = InMemoryTokenLedger::new();
        let price = Price::parse("1").unwrap();

        ledger.set_mint_failure(Some(FailureMode::Submission));
        assert!(matches!(
            ledger.mint(&addr('a'), price).await,
            Err(ChainError::Submission(_))
        ));

        ledger.set_mint_failure(Some(FailureMode::ConfirmationTimeout));
        assert!(matches!(
            ledger.mint(&addr('a'), price).await,
            Err(ChainError::ConfirmationTimeout { .. })
        ));

        ledger.set_mint_failure(Some(FailureMode::EventMissing));
        assert!(matches!(
            ledger.mint(&addr('a'), price).await,
            Err(ChainError::EventMissing { .. })
        ));

        ledger.set_mint_failure(None);
        assert_eq!(ledger.mint(&addr('a'), price).await.unwrap(), TokenId::new(1));
        assert_eq!(ledger.mint_count(), 4);
    }
}
