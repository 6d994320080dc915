//! Session-token identity provider.
//!
//! `POST /auth/login` exchanges an email for an opaque UUID bearer
//! token; subsequent requests carry `Authorization: Bearer <token>`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use uuid::Uuid;

use super::{IdentityProvider, LoginOutcome};
use crate::error::GatewayError;
use crate::persistence::{Store, StoredUser};

/// Identity provider backed by the `sessions` table.
#[derive(Debug)]
pub struct SessionIdentity {
    store: Arc<dyn Store>,
}

impl SessionIdentity {
    /// Creates a provider over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn bearer_token(headers: &HeaderMap) -> Result<Uuid, GatewayError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| GatewayError::Unauthorized("missing bearer token".to_string()))?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| GatewayError::Unauthorized("malformed authorization header".to_string()))?;
        Uuid::parse_str(token)
            .map_err(|_| GatewayError::Unauthorized("malformed session token".to_string()))
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentity {
    async fn resolve(&self, headers: &HeaderMap) -> Result<StoredUser, GatewayError> {
        let token = Self::bearer_token(headers)?;
        self.store
            .user_for_session(token)
            .await?
            .ok_or_else(|| GatewayError::Unauthorized("unknown session token".to_string()))
    }

    async fn login(&self, email: &str, name: &str) -> Result<LoginOutcome, GatewayError> {
        if email.trim().is_empty() {
            return Err(GatewayError::InvalidRequest("email is required".to_string()));
        }
        let user = self.store.get_or_create_user(email, name).await?;
        let token = self.store.create_session(user.id).await?;
        tracing::info!(user_id = %user.id, "session issued");
        Ok(LoginOutcome { token, user })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn provider() -> SessionIdentity {
        SessionIdentity::new(Arc::new(MemoryStore::new()))
    }

    fn headers_with_token(token: Uuid) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let Ok(value) = format!("Bearer {token}").parse() else {
            panic!("header value");
        };
        headers.insert(header::AUTHORIZATION, value);
        headers
    }

    #[tokio::test]
    async fn login_then_resolve_round_trips() {
        let provider = provider();
        let outcome = provider.login("ada@example.org", "Ada").await;
        let Ok(outcome) = outcome else {
            panic!("login failed");
        };

        let resolved = provider.resolve(&headers_with_token(outcome.token)).await;
        let Ok(resolved) = resolved else {
            panic!("resolve failed");
        };
        assert_eq!(resolved.id, outcome.user.id);
        assert_eq!(resolved.email.as_deref(), Some("ada@example.org"));
    }

    #[tokio::test]
    async fn login_twice_reuses_the_user() {
        let provider = provider();
        let Ok(first) = provider.login("ada@example.org", "Ada").await else {
            panic!("first login failed");
        };
        let Ok(second) = provider.login("ada@example.org", "Ada").await else {
            panic!("second login failed");
        };
        assert_eq!(first.user.id, second.user.id);
        assert_ne!(first.token, second.token);
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let provider = provider();
        let result = provider.resolve(&headers_with_token(Uuid::new_v4())).await;
        assert!(matches!(result, Err(GatewayError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let provider = provider();
        let result = provider.resolve(&HeaderMap::new()).await;
        assert!(matches!(result, Err(GatewayError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn empty_email_is_rejected() {
        let provider = provider();
        let result = provider.login("  ", "Ada").await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }
}
