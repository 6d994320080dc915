//! Authentication endpoints.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{LoginRequest, LoginResponse, UserDto};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /auth/login` — Exchange an email for a session token.
///
/// Only available when the session identity provider is configured;
/// the wallet provider authenticates per-request instead.
///
/// # Errors
///
/// Returns [`GatewayError`] when the configured provider has no login
/// flow or on storage failure.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    summary = "Log in with an email",
    description = "Creates the user on first sight and issues an opaque bearer token.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 400, description = "Login not supported or invalid", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let name = if req.name.trim().is_empty() {
        req.email.clone()
    } else {
        req.name
    };
    let outcome = state.identity.login(&req.email, &name).await?;
    Ok(Json(LoginResponse {
        token: outcome.token,
        user: UserDto::from(outcome.user),
    }))
}

/// `GET /users/me` — Profile of the resolved caller.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] when the caller cannot be
/// resolved.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Auth",
    summary = "Get the caller's profile",
    description = "Resolves the configured identity scheme's credentials to a user profile.",
    responses(
        (status = 200, description = "Caller profile", body = UserDto),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    )
)]
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    let caller = state.identity.resolve(&headers).await?;
    Ok(Json(UserDto::from(caller)))
}

/// Authentication routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/users/me", get(me))
}
