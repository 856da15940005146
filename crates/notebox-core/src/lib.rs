#![deny(missing_docs)]

//! # notebox-core — Foundational Types
//!
//! Every other crate in the workspace depends on this one. It has no
//! internal dependencies, only `serde`, `thiserror` and `chrono`.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** A [`ContentId`] cannot be
//!    passed where a [`UserId`] is expected, and a [`WalletAddress`] is
//!    always well-formed once constructed.
//!
//! 2. **Money is never floating point.** [`Price`] parses a decimal string
//!    straight into chain base units (wei) and renders back without loss.
//!
//! 3. **Closed action set.** Retrieval is dispatched on [`RetrieveAction`],
//!    a two-variant enum matched exhaustively everywhere.

pub mod domain;
pub mod error;
pub mod identity;
pub mod price;

// Re-export primary types at crate root for ergonomic imports.
pub use domain::{Document, OwnershipToken, PurchaseRecord, RetrieveAction};
pub use error::ValidationError;
pub use identity::{ContentId, TokenId, UserId, WalletAddress};
pub use price::{Price, BASE_UNITS_PER_COIN, MAX_PRICE_COINS};
