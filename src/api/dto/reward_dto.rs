//! Reward, ledger, and leaderboard DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::leaderboard::Standing;
use crate::domain::{Transaction, TransactionKind};
use crate::persistence::StoredCatalogReward;

/// Current spendable balance for `GET /rewards/balance`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    /// Points available for redemption.
    pub balance: i64,
    /// When the balance was computed.
    pub as_of: DateTime<Utc>,
}

/// One ledger transaction as rendered in the history view.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionDto {
    /// Transaction id.
    #[schema(value_type = i64)]
    pub id: crate::domain::TransactionId,
    /// Earning or redemption discriminator.
    #[schema(value_type = String, example = "earned_report")]
    pub kind: TransactionKind,
    /// Point quantity (always positive; sign implied by `kind`).
    pub amount: i64,
    /// Human-readable description.
    pub description: String,
    /// Append timestamp.
    pub date: DateTime<Utc>,
}

impl From<Transaction> for TransactionDto {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            kind: tx.kind,
            amount: tx.amount,
            description: tx.description,
            date: tx.created_at,
        }
    }
}

/// Response body for `GET /rewards/transactions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionListResponse {
    /// Full history, newest first.
    pub data: Vec<TransactionDto>,
}

/// One redeemable catalog entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogRewardDto {
    /// Catalog id.
    #[schema(value_type = i64)]
    pub id: crate::domain::RewardId,
    /// Reward name.
    pub name: String,
    /// Point price.
    pub cost: i64,
    /// Catalog description.
    pub description: String,
    /// How to collect the redeemed reward.
    pub collection_info: String,
}

impl From<StoredCatalogReward> for CatalogRewardDto {
    fn from(entry: StoredCatalogReward) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            cost: entry.cost,
            description: entry.description,
            collection_info: entry.collection_info,
        }
    }
}

/// Response body for `GET /rewards`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogListResponse {
    /// Redeemable entries, cheapest first.
    pub data: Vec<CatalogRewardDto>,
}

/// Request body for `POST /rewards/redeem`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RedeemRequest {
    /// Catalog reward id, or `0` to redeem the entire balance.
    pub reward_id: i64,
}

/// Response body for `POST /rewards/redeem`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RedeemResponse {
    /// The appended redemption transaction.
    pub transaction: TransactionDto,
    /// Spendable balance after the redemption.
    pub balance: i64,
}

/// One ranked leaderboard row.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardEntryDto {
    /// 1-based rank.
    pub rank: u32,
    /// User id.
    #[schema(value_type = i64)]
    pub user_id: crate::domain::UserId,
    /// Summed reward points.
    pub points: i64,
    /// Reward level.
    pub level: i32,
    /// Display name, when known.
    pub user_name: Option<String>,
}

impl LeaderboardEntryDto {
    /// Attaches a 1-based rank to an aggregated standing.
    #[must_use]
    pub fn from_standing(rank: u32, standing: Standing) -> Self {
        Self {
            rank,
            user_id: standing.user_id,
            points: standing.points,
            level: standing.level,
            user_name: standing.user_name,
        }
    }
}

/// Response body for `GET /leaderboard`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Rank-ordered standings.
    pub data: Vec<LeaderboardEntryDto>,
}
