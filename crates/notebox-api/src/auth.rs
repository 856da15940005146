//! # Session Authentication
//!
//! Bearer tokens resolve to a [`UserId`] through a [`SessionProvider`].
//! The bundled [`StaticSessionProvider`] is a fixed token map loaded from
//! `NOTEBOX_SESSION_TOKENS`:
//!
//! ```bash
//! export NOTEBOX_SESSION_TOKENS="s3cr3t-alice=alice@0x70997970c51812dc3a010c7d01b50e0d17dc79c8,s3cr3t-bob=bob"
//! ```
//!
//! An entry may bind a wallet with `@0x…`. Purchases are sent from the
//! buyer's address through the node's managed accounts, so a user may only
//! pay from a wallet bound to one of their sessions. A user with no bound
//! wallet can browse and publish but not buy.
//!
//! Token comparison is constant-time and scans every entry.
//!
//! Handlers take [`CurrentUser`] when a session is mandatory and
//! [`MaybeUser`] when it is optional (previews are public).

use std::fmt;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use notebox_core::{UserId, ValidationError, WalletAddress};
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::error::AppError;
use crate::state::AppState;

/// Environment variable holding the static session map.
pub const SESSION_TOKENS_ENV: &str = "NOTEBOX_SESSION_TOKENS";

/// Resolves a presented bearer token to the session's user.
pub trait SessionProvider: Send + Sync {
    /// The user behind `token`, or `None` for an unknown token.
    fn resolve(&self, token: &str) -> Option<UserId>;

    /// Whether `user` may pay from `wallet`.
    fn may_spend_from(&self, user: &UserId, wallet: &WalletAddress) -> bool;
}

/// Errors parsing a static session map.
#[derive(Error, Debug)]
pub enum AuthConfigError {
    /// Entry is not `token=userId`.
    #[error("malformed session entry #{0} (expected token=userId)")]
    MalformedEntry(usize),

    /// User id in an entry failed validation.
    #[error("session entry #{0}: {1}")]
    InvalidUser(usize, ValidationError),

    /// Bound wallet in an entry failed validation.
    #[error("session entry #{0}: {1}")]
    InvalidWallet(usize, ValidationError),
}

/// A fixed map of bearer tokens to users.
#[derive(Default)]
pub struct StaticSessionProvider {
    sessions: Vec<(Zeroizing<String>, UserId)>,
    wallets: Vec<(UserId, WalletAddress)>,
}

impl StaticSessionProvider {
    /// An empty provider. Every token is rejected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session.
    pub fn with_session(mut self, token: impl Into<String>, user: UserId) -> Self {
        self.sessions.push((Zeroizing::new(token.into()), user));
        self
    }

    /// Let `user` pay from `wallet`.
    pub fn with_wallet(mut self, user: UserId, wallet: WalletAddress) -> Self {
        self.wallets.push((user, wallet));
        self
    }

    /// Parse `token=userId[@wallet][,…]`. Blank input yields an empty map.
    ///
    /// A suffix after the last `@` is read as a wallet only when it starts
    /// with `0x`, so user ids such as e-mail addresses pass through intact.
    pub fn parse(raw: &str) -> Result<Self, AuthConfigError> {
        let mut provider = Self::new();
        for (index, entry) in raw.split(',').map(str::trim).enumerate() {
            if entry.is_empty() {
                continue;
            }
            let (token, user) = entry
                .split_once('=')
                .ok_or(AuthConfigError::MalformedEntry(index))?;
            let (token, user) = (token.trim(), user.trim());
            if token.is_empty() {
                return Err(AuthConfigError::MalformedEntry(index));
            }
            let (user, wallet) = match user.rsplit_once('@') {
                Some((user, wallet)) if wallet.starts_with("0x") => (user, Some(wallet)),
                _ => (user, None),
            };
            let user = UserId::new(user).map_err(|e| AuthConfigError::InvalidUser(index, e))?;
            if let Some(wallet) = wallet {
                let wallet = WalletAddress::new(wallet)
                    .map_err(|e| AuthConfigError::InvalidWallet(index, e))?;
                provider = provider.with_wallet(user.clone(), wallet);
            }
            provider = provider.with_session(token, user);
        }
        Ok(provider)
    }

    /// Load from [`SESSION_TOKENS_ENV`]. An unset variable yields an empty map.
    pub fn from_env() -> Result<Self, AuthConfigError> {
        match std::env::var(SESSION_TOKENS_ENV) {
            Ok(raw) => Self::parse(&Zeroizing::new(raw)),
            Err(_) => {
                tracing::warn!("{SESSION_TOKENS_ENV} not set; all authenticated routes will reject");
                Ok(Self::new())
            }
        }
    }

    /// Number of configured sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are configured.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionProvider for StaticSessionProvider {
    fn resolve(&self, token: &str) -> Option<UserId> {
        let mut found = None;
        for (candidate, user) in &self.sessions {
            if bool::from(candidate.as_bytes().ct_eq(token.as_bytes())) {
                found = Some(user.clone());
            }
        }
        found
    }

    fn may_spend_from(&self, user: &UserId, wallet: &WalletAddress) -> bool {
        self.wallets
            .iter()
            .any(|(owner, bound)| owner == user && bound == wallet)
    }
}

impl fmt::Debug for StaticSessionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSessionProvider")
            .field("sessions", &self.sessions.len())
            .field("wallets", &self.wallets.len())
            .finish()
    }
}

/// The authenticated requester. Rejects with 401 when absent or unknown.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

/// The requester if a valid session was presented.
///
/// Missing and unknown tokens both yield `None`; the handler decides
/// whether that is acceptable.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<UserId>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

fn resolve(parts: &Parts, sessions: &Arc<dyn SessionProvider>) -> Option<UserId> {
    bearer_token(parts).and_then(|token| sessions.resolve(token))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if bearer_token(parts).is_none() {
            return Err(AppError::Unauthorized("missing bearer token".into()));
        }
        resolve(parts, &state.sessions)
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("unknown session".into()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve(parts, &state.sessions)))
    }
}
