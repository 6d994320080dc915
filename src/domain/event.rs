//! Domain events emitted by ledger and collection operations.
//!
//! Events are broadcast through the [`super::EventBus`]. Notification
//! delivery is outside this service; an external notifier subscribes to
//! the bus and turns these events into user-facing messages.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ids::{ReportId, UserId};
use super::report_status::ReportStatus;
use super::transaction::TransactionKind;

/// Event emitted after a successful state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A transaction of an earning kind was appended.
    PointsEarned {
        /// User who earned the points.
        user_id: UserId,
        /// Which earning flow produced them.
        kind: TransactionKind,
        /// Points granted.
        amount: i64,
        /// Ledger description.
        description: String,
        /// Append timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A redeemed transaction was appended.
    PointsRedeemed {
        /// User who spent the points.
        user_id: UserId,
        /// Points spent.
        amount: i64,
        /// Ledger description naming the reward.
        description: String,
        /// Append timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A report moved through its collection lifecycle.
    ReportStatusChanged {
        /// Report whose status changed.
        report_id: ReportId,
        /// New status.
        status: ReportStatus,
        /// Collector driving the change, when one is involved.
        collector_id: Option<UserId>,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// Returns the user a notification about this event would target.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::PointsEarned { user_id, .. } | Self::PointsRedeemed { user_id, .. } => {
                Some(*user_id)
            }
            Self::ReportStatusChanged { collector_id, .. } => *collector_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::PointsEarned { .. } => "points_earned",
            Self::PointsRedeemed { .. } => "points_redeemed",
            Self::ReportStatusChanged { .. } => "report_status_changed",
        }
    }
}
