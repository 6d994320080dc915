//! Wallet-signature identity provider.
//!
//! The caller proves control of an ed25519 key by signing a
//! timestamped challenge message. The hex public key doubles as the
//! wallet address and resolves to a user record, created on first
//! sight. Timestamps outside a short past window are rejected so a
//! captured signature cannot be replayed later.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use super::{IdentityProvider, LoginOutcome};
use crate::error::GatewayError;
use crate::persistence::{Store, StoredUser};

/// Header carrying the hex ed25519 public key.
pub const ADDRESS_HEADER: &str = "x-wallet-address";
/// Header carrying the unix timestamp the challenge was signed at.
pub const TIMESTAMP_HEADER: &str = "x-wallet-timestamp";
/// Header carrying the hex signature over the challenge message.
pub const SIGNATURE_HEADER: &str = "x-wallet-signature";

/// Acceptance window for challenge timestamps, in seconds.
const TIMESTAMP_WINDOW_SECS: i64 = 5 * 60;

/// Identity provider backed by ed25519 signature verification.
#[derive(Debug)]
pub struct WalletIdentity {
    store: Arc<dyn Store>,
}

impl WalletIdentity {
    /// Creates a provider over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

/// Builds the challenge message a wallet signs for authentication.
#[must_use]
pub fn challenge_message(address: &str, timestamp: i64) -> String {
    format!("ecotrack-auth:{address}:{timestamp}")
}

/// Accepts only past timestamps within the window, so a future
/// timestamp cannot extend a signature's lifetime.
fn is_timestamp_valid(timestamp: i64) -> bool {
    let now = chrono::Utc::now().timestamp();
    timestamp <= now && (now - timestamp) < TIMESTAMP_WINDOW_SECS
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, GatewayError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| GatewayError::Unauthorized(format!("missing {name} header")))
}

fn verify_signature(address: &str, message: &str, signature_hex: &str) -> Result<(), GatewayError> {
    let key_bytes: [u8; 32] = hex::decode(address)
        .ok()
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| GatewayError::Unauthorized("malformed wallet address".to_string()))?;
    let verifying_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|_| GatewayError::Unauthorized("invalid wallet public key".to_string()))?;

    let sig_hex = signature_hex.strip_prefix("0x").unwrap_or(signature_hex);
    let sig_bytes: [u8; 64] = hex::decode(sig_hex)
        .ok()
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| GatewayError::Unauthorized("malformed signature".to_string()))?;
    let signature = Signature::from_bytes(&sig_bytes);

    verifying_key
        .verify(message.as_bytes(), &signature)
        .map_err(|_| GatewayError::Unauthorized("signature verification failed".to_string()))
}

#[async_trait]
impl IdentityProvider for WalletIdentity {
    async fn resolve(&self, headers: &HeaderMap) -> Result<StoredUser, GatewayError> {
        let address = header_str(headers, ADDRESS_HEADER)?;
        let timestamp: i64 = header_str(headers, TIMESTAMP_HEADER)?
            .parse()
            .map_err(|_| GatewayError::Unauthorized("malformed timestamp".to_string()))?;
        let signature = header_str(headers, SIGNATURE_HEADER)?;

        if !is_timestamp_valid(timestamp) {
            return Err(GatewayError::Unauthorized(
                "challenge timestamp outside acceptance window".to_string(),
            ));
        }
        verify_signature(address, &challenge_message(address, timestamp), signature)?;

        self.store.get_or_create_wallet_user(address).await
    }

    async fn login(&self, _email: &str, _name: &str) -> Result<LoginOutcome, GatewayError> {
        Err(GatewayError::InvalidRequest(
            "login is not supported by the wallet identity provider".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use ed25519_dalek::{Signer, SigningKey};

    fn provider() -> WalletIdentity {
        WalletIdentity::new(Arc::new(MemoryStore::new()))
    }

    fn signed_headers(key: &SigningKey, timestamp: i64) -> HeaderMap {
        let address = hex::encode(key.verifying_key().to_bytes());
        let signature = key.sign(challenge_message(&address, timestamp).as_bytes());

        let mut headers = HeaderMap::new();
        let entries = [
            (ADDRESS_HEADER, address),
            (TIMESTAMP_HEADER, timestamp.to_string()),
            (SIGNATURE_HEADER, hex::encode(signature.to_bytes())),
        ];
        for (name, value) in entries {
            let Ok(value) = value.parse() else {
                panic!("header value");
            };
            let Ok(name) = axum::http::HeaderName::try_from(name) else {
                panic!("header name");
            };
            headers.insert(name, value);
        }
        headers
    }

    #[tokio::test]
    async fn valid_signature_resolves_and_creates_user() {
        let provider = provider();
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let headers = signed_headers(&key, chrono::Utc::now().timestamp());

        let first = provider.resolve(&headers).await;
        let Ok(first) = first else {
            panic!("resolve failed");
        };
        assert_eq!(
            first.wallet_address.as_deref(),
            Some(hex::encode(key.verifying_key().to_bytes()).as_str())
        );

        // Same wallet resolves to the same user.
        let Ok(second) = provider.resolve(&headers).await else {
            panic!("second resolve failed");
        };
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn tampered_signature_is_rejected() {
        let provider = provider();
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let other = SigningKey::from_bytes(&[8u8; 32]);
        let timestamp = chrono::Utc::now().timestamp();

        let address = hex::encode(key.verifying_key().to_bytes());
        let forged = other.sign(challenge_message(&address, timestamp).as_bytes());

        let mut headers = signed_headers(&key, timestamp);
        let Ok(value) = hex::encode(forged.to_bytes()).parse() else {
            panic!("header value");
        };
        headers.insert(SIGNATURE_HEADER, value);

        let result = provider.resolve(&headers).await;
        assert!(matches!(result, Err(GatewayError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn stale_timestamp_is_rejected() {
        let provider = provider();
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let stale = chrono::Utc::now().timestamp() - 600;
        let result = provider.resolve(&signed_headers(&key, stale)).await;
        assert!(matches!(result, Err(GatewayError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn future_timestamp_is_rejected() {
        let provider = provider();
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let future = chrono::Utc::now().timestamp() + 120;
        let result = provider.resolve(&signed_headers(&key, future)).await;
        assert!(matches!(result, Err(GatewayError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn login_flow_is_rejected() {
        let provider = provider();
        let result = provider.login("ada@example.org", "Ada").await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }
}
