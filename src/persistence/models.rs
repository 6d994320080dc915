//! Database models for users, rewards, catalog entries, and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ReportId, ReportStatus, RewardId, UserId};

/// A user row from the `users` table.
///
/// Exactly one of `email` (session identity) or `wallet_address`
/// (wallet identity) is set by the provider that created the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    /// Surrogate key.
    pub id: UserId,
    /// Login email, when created by the session provider.
    pub email: Option<String>,
    /// Display name.
    pub name: String,
    /// Hex ed25519 public key, when created by the wallet provider.
    pub wallet_address: Option<String>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A denormalized reward aggregate row from the `rewards` table.
///
/// Tracks a running point total updated in place on each earn and
/// redemption. This is the leaderboard's source, separate from the
/// transaction-derived spendable balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReward {
    /// Surrogate key.
    pub id: i64,
    /// User this aggregate belongs to.
    pub user_id: UserId,
    /// Running point total.
    pub points: i64,
    /// Reward level (starts at 1).
    pub level: i32,
    /// Display name captured at first earn.
    pub user_name: Option<String>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last increment/decrement timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A redeemable catalog entry from the `catalog_rewards` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCatalogReward {
    /// Surrogate key.
    pub id: RewardId,
    /// Reward name shown in the catalog and in ledger descriptions.
    pub name: String,
    /// Point price; entries with `cost = 0` are hidden from redemption.
    pub cost: i64,
    /// Catalog description.
    pub description: String,
    /// How to collect the redeemed reward.
    pub collection_info: String,
}

/// A waste report row from the `reports` table.
///
/// The report doubles as its collection task: `status` and
/// `collector_id` track the collection lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReport {
    /// Surrogate key.
    pub id: ReportId,
    /// Reporting user.
    pub user_id: UserId,
    /// Free-form location description.
    pub location: String,
    /// Waste category (e.g. `"plastic"`).
    pub waste_type: String,
    /// Estimated quantity, free-form (e.g. `"5 kg"`).
    pub amount: String,
    /// Optional image URL (storage is external).
    pub image_url: Option<String>,
    /// Collection lifecycle state.
    pub status: ReportStatus,
    /// Collector who claimed the task, if any.
    pub collector_id: Option<UserId>,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change timestamp.
    pub updated_at: DateTime<Utc>,
}
