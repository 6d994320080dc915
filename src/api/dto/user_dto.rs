//! Authentication and user-profile DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::persistence::StoredUser;

/// Request body for `POST /auth/login` (session provider only).
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Login email; the user is created on first sight.
    pub email: String,
    /// Display name used when creating the user.
    #[serde(default)]
    pub name: String,
}

/// Response body for `POST /auth/login`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Opaque bearer token for subsequent requests.
    pub token: Uuid,
    /// The resolved user profile.
    pub user: UserDto,
}

/// A user profile.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDto {
    /// User id.
    #[schema(value_type = i64)]
    pub id: crate::domain::UserId,
    /// Login email, when created by the session provider.
    pub email: Option<String>,
    /// Display name.
    pub name: String,
    /// Wallet address, when created by the wallet provider.
    pub wallet_address: Option<String>,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<StoredUser> for UserDto {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            wallet_address: user.wallet_address,
            created_at: user.created_at,
        }
    }
}
