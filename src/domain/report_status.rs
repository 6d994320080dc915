//! Collection lifecycle of a waste report.

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Lifecycle state of a report's collection task.
///
/// A report starts `pending`. A collector claims it (`in_progress`),
/// optionally marks the pickup done (`completed`), and verification
/// with photo evidence moves it to `verified`, the terminal state that
/// triggers the collection reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Waiting for a collector to claim the task.
    Pending,
    /// Claimed by a collector.
    InProgress,
    /// Pickup done, awaiting verification.
    Completed,
    /// Collection verified; reward granted.
    Verified,
}

impl ReportStatus {
    /// Returns the stored string form of this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Verified => "verified",
        }
    }

    /// Returns `true` if a task may move from `self` to `next`.
    ///
    /// Claiming is only possible from `pending`; verification only from
    /// an active (claimed or completed) task. `verified` is terminal.
    #[must_use]
    pub const fn can_transition(&self, next: Self) -> bool {
        matches!(
            (*self, next),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Pending)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Verified)
                | (Self::Completed, Self::Verified)
        )
    }
}

impl TryFrom<&str> for ReportStatus {
    type Error = GatewayError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "verified" => Ok(Self::Verified),
            other => Err(GatewayError::InvalidRequest(format!(
                "unknown report status: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn claim_only_from_pending() {
        assert!(ReportStatus::Pending.can_transition(ReportStatus::InProgress));
        assert!(!ReportStatus::Completed.can_transition(ReportStatus::InProgress));
        assert!(!ReportStatus::Verified.can_transition(ReportStatus::InProgress));
    }

    #[test]
    fn verified_is_terminal() {
        for next in [
            ReportStatus::Pending,
            ReportStatus::InProgress,
            ReportStatus::Completed,
            ReportStatus::Verified,
        ] {
            assert!(!ReportStatus::Verified.can_transition(next));
        }
    }

    #[test]
    fn collector_can_abandon_a_claim() {
        assert!(ReportStatus::InProgress.can_transition(ReportStatus::Pending));
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            ReportStatus::Pending,
            ReportStatus::InProgress,
            ReportStatus::Completed,
            ReportStatus::Verified,
        ] {
            assert_eq!(ReportStatus::try_from(status.as_str()).ok(), Some(status));
        }
        assert!(ReportStatus::try_from("done").is_err());
    }
}
