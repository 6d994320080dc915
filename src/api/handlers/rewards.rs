//! Reward endpoints: catalog, balance, history, redemption, leaderboard.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    BalanceResponse, CatalogListResponse, CatalogRewardDto, LeaderboardEntryDto,
    LeaderboardResponse, RedeemRequest, RedeemResponse, TransactionDto, TransactionListResponse,
};
use crate::app_state::AppState;
use crate::domain::RewardId;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /rewards` — List redeemable catalog entries.
///
/// # Errors
///
/// Returns [`GatewayError`] when the caller cannot be resolved or on
/// storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/rewards",
    tag = "Rewards",
    summary = "List redeemable rewards",
    description = "Returns catalog entries with a positive point cost, cheapest first.",
    responses(
        (status = 200, description = "Redeemable catalog", body = CatalogListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    )
)]
pub async fn get_catalog(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    let _caller = state.identity.resolve(&headers).await?;
    let entries = state.ledger.available_rewards().await?;
    Ok(Json(CatalogListResponse {
        data: entries.into_iter().map(CatalogRewardDto::from).collect(),
    }))
}

/// `GET /rewards/balance` — Current spendable balance for the caller.
///
/// # Errors
///
/// Returns [`GatewayError`] when the caller cannot be resolved or on
/// storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/rewards/balance",
    tag = "Rewards",
    summary = "Get spendable balance",
    description = "Recomputes the balance from the caller's full transaction history.",
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    )
)]
pub async fn get_balance(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    let caller = state.identity.resolve(&headers).await?;
    let balance = state.ledger.balance(caller.id).await?;
    Ok(Json(BalanceResponse {
        balance,
        as_of: Utc::now(),
    }))
}

/// `GET /rewards/transactions` — Full transaction history for the caller.
///
/// # Errors
///
/// Returns [`GatewayError`] when the caller cannot be resolved or on
/// storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/rewards/transactions",
    tag = "Rewards",
    summary = "Get transaction history",
    description = "Returns the caller's full ledger history, newest first.",
    responses(
        (status = 200, description = "Transaction history", body = TransactionListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    )
)]
pub async fn get_transactions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    let caller = state.identity.resolve(&headers).await?;
    let history = state.ledger.transactions(caller.id).await?;
    Ok(Json(TransactionListResponse {
        data: history.into_iter().map(TransactionDto::from).collect(),
    }))
}

/// `POST /rewards/redeem` — Redeem a catalog reward or the whole balance.
///
/// # Errors
///
/// Returns [`GatewayError`] on unknown reward, insufficient balance, or
/// storage failure.
#[utoipa::path(
    post,
    path = "/api/v1/rewards/redeem",
    tag = "Rewards",
    summary = "Redeem points",
    description = "Redeems the named catalog reward, or the caller's entire balance when `reward_id` is 0. The balance check and the ledger append run atomically.",
    request_body = RedeemRequest,
    responses(
        (status = 200, description = "Redemption recorded", body = RedeemResponse),
        (status = 404, description = "Reward not found", body = ErrorResponse),
        (status = 422, description = "Insufficient balance", body = ErrorResponse),
    )
)]
pub async fn redeem(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RedeemRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let caller = state.identity.resolve(&headers).await?;
    let tx = state
        .ledger
        .redeem(caller.id, RewardId::new(req.reward_id))
        .await?;
    let balance = state.ledger.balance(caller.id).await?;
    Ok(Json(RedeemResponse {
        transaction: TransactionDto::from(tx),
        balance,
    }))
}

/// `GET /leaderboard` — Ranked standings by accumulated points.
///
/// # Errors
///
/// Returns [`GatewayError`] when the caller cannot be resolved or on
/// storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/leaderboard",
    tag = "Rewards",
    summary = "Get the leaderboard",
    description = "Returns one row per user, ordered by summed reward points descending.",
    responses(
        (status = 200, description = "Ranked standings", body = LeaderboardResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    )
)]
pub async fn leaderboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    let _caller = state.identity.resolve(&headers).await?;
    let standings = state.ledger.leaderboard().await?;
    let data = standings
        .into_iter()
        .enumerate()
        .map(|(idx, standing)| {
            let rank = u32::try_from(idx.saturating_add(1)).unwrap_or(u32::MAX);
            LeaderboardEntryDto::from_standing(rank, standing)
        })
        .collect();
    Ok(Json(LeaderboardResponse { data }))
}

/// Reward and leaderboard routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rewards", get(get_catalog))
        .route("/rewards/balance", get(get_balance))
        .route("/rewards/transactions", get(get_transactions))
        .route("/rewards/redeem", post(redeem))
        .route("/leaderboard", get(leaderboard))
}
