//! Ledger transaction records.
//!
//! A [`Transaction`] is an immutable fact: once appended it is never
//! updated or deleted. The spendable balance is derived from the full
//! set of a user's transactions, never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{TransactionId, UserId};
use crate::error::GatewayError;

/// Discriminator for ledger transactions.
///
/// Earning kinds increase the derived balance; [`Redeemed`] decreases
/// it. The wire and database representation is the snake_case string
/// (`"earned_report"`, `"earned_collect"`, `"redeemed"`).
///
/// [`Redeemed`]: TransactionKind::Redeemed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Points earned for submitting a waste report.
    EarnedReport,
    /// Points earned for a verified waste collection.
    EarnedCollect,
    /// Points spent on a catalog reward.
    Redeemed,
}

impl TransactionKind {
    /// Returns the stored string form of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EarnedReport => "earned_report",
            Self::EarnedCollect => "earned_collect",
            Self::Redeemed => "redeemed",
        }
    }

    /// Returns `true` for kinds that increase the balance.
    #[must_use]
    pub const fn is_earning(&self) -> bool {
        matches!(self, Self::EarnedReport | Self::EarnedCollect)
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = GatewayError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "earned_report" => Ok(Self::EarnedReport),
            "earned_collect" => Ok(Self::EarnedCollect),
            "redeemed" => Ok(Self::Redeemed),
            other => Err(GatewayError::Internal(format!(
                "unknown transaction kind: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single row of the append-only reward ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Auto-increment row id.
    pub id: TransactionId,
    /// Owner of the transaction.
    pub user_id: UserId,
    /// Earning or redemption discriminator.
    pub kind: TransactionKind,
    /// Point quantity, always positive; the sign is implied by `kind`.
    pub amount: i64,
    /// Human-readable description shown in the history view.
    pub description: String,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            TransactionKind::EarnedReport,
            TransactionKind::EarnedCollect,
            TransactionKind::Redeemed,
        ] {
            let parsed = TransactionKind::try_from(kind.as_str()).ok();
            assert_eq!(parsed, Some(kind));
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(TransactionKind::try_from("bonus").is_err());
    }

    #[test]
    fn earning_kinds_are_flagged() {
        assert!(TransactionKind::EarnedReport.is_earning());
        assert!(TransactionKind::EarnedCollect.is_earning());
        assert!(!TransactionKind::Redeemed.is_earning());
    }

    #[test]
    fn serde_uses_snake_case_strings() {
        let json = serde_json::to_string(&TransactionKind::EarnedCollect).ok();
        assert_eq!(json.as_deref(), Some("\"earned_collect\""));
    }
}
