//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each
//! variant maps to a specific HTTP status code and structured JSON
//! error response. Nothing is retried server-side: every failure
//! surfaces to the caller, who may re-attempt the action.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ReportId, RewardId, UserId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "insufficient balance: need 40, have 25",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                |
/// |-----------|-------------------|----------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request            |
/// | 2000–2999 | Not Found         | 404 Not Found              |
/// | 3000–3999 | Server            | 500 Internal Server Error  |
/// | 4000–4009 | Ledger rejections | 422 Unprocessable Entity   |
/// | 4010      | Unauthorized      | 401 Unauthorized           |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// User with the given id was not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// Catalog reward with the given id was not found (or has no cost).
    #[error("reward not found: {0}")]
    RewardNotFound(RewardId),

    /// Report with the given id was not found.
    #[error("report not found: {0}")]
    ReportNotFound(ReportId),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A non-positive amount was passed to an earning operation.
    #[error("invalid amount: {0} (must be positive)")]
    InvalidAmount(i64),

    /// Redemption costs more than the computed balance.
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance {
        /// Points the redemption requires.
        required: i64,
        /// Points currently available.
        available: i64,
    },

    /// Caller identity could not be resolved.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Persistence layer failure (network/database error).
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidAmount(_) => 1002,
            Self::UserNotFound(_) => 2001,
            Self::RewardNotFound(_) => 2002,
            Self::ReportNotFound(_) => 2003,
            Self::InsufficientBalance { .. } => 4001,
            Self::Unauthorized(_) => 4010,
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            Self::UserNotFound(_) | Self::RewardNotFound(_) | Self::ReportNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_balance_maps_to_422() {
        let err = GatewayError::InsufficientBalance {
            required: 40,
            available: 25,
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), 4001);
    }

    #[test]
    fn not_found_variants_map_to_404() {
        assert_eq!(
            GatewayError::UserNotFound(UserId::new(1)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::RewardNotFound(RewardId::new(2)).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn invalid_amount_maps_to_400() {
        let err = GatewayError::InvalidAmount(-3);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("-3"));
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let err = GatewayError::Unauthorized("missing bearer token".to_string());
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.error_code(), 4010);
    }
}
