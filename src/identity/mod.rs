//! Pluggable identity providers.
//!
//! Two incompatible authentication schemes exist for the platform: a
//! session-cookie flow and a wallet-signature flow. They are modeled as
//! alternative implementations of one capability, selected at
//! deployment configuration time and never active together. Handlers
//! resolve the caller once at the edge; every operation below the
//! handler layer takes the explicit, already-validated [`UserId`].
//!
//! [`UserId`]: crate::domain::UserId

pub mod session;
pub mod wallet;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use uuid::Uuid;

pub use session::SessionIdentity;
pub use wallet::WalletIdentity;

use crate::config::AuthProviderKind;
use crate::error::GatewayError;
use crate::persistence::{Store, StoredUser};

/// Result of a successful session login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Opaque bearer token for subsequent requests.
    pub token: Uuid,
    /// The resolved (possibly just-created) user.
    pub user: StoredUser,
}

/// Capability for resolving the calling user from request headers.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// Resolves request headers to the calling user, creating the user
    /// record on first sight where the scheme allows it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthorized`] when the credentials are
    /// missing or invalid, [`GatewayError::PersistenceError`] on
    /// storage failure.
    async fn resolve(&self, headers: &HeaderMap) -> Result<StoredUser, GatewayError>;

    /// Performs an email login, creating the user on first sight.
    ///
    /// Only meaningful for the session provider; the wallet provider
    /// rejects this call.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] when the configured
    /// provider has no login flow, [`GatewayError::PersistenceError`]
    /// on storage failure.
    async fn login(&self, email: &str, name: &str) -> Result<LoginOutcome, GatewayError>;
}

/// Builds the identity provider selected by configuration.
#[must_use]
pub fn provider_for(kind: AuthProviderKind, store: Arc<dyn Store>) -> Arc<dyn IdentityProvider> {
    match kind {
        AuthProviderKind::Session => Arc::new(SessionIdentity::new(store)),
        AuthProviderKind::Wallet => Arc::new(WalletIdentity::new(store)),
    }
}
