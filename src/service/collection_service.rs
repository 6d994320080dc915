//! Waste report submission and the collection task lifecycle.
//!
//! Reports double as collection tasks. Submitting a report awards the
//! reporter points through the [`RewardLedger`]; a verified collection
//! awards the collector. Status changes are validated against the
//! lifecycle rules in [`ReportStatus`] and only the claiming collector
//! may advance a claimed task.

use std::sync::Arc;

use chrono::Utc;

use super::RewardLedger;
use crate::domain::{
    EventBus, LedgerEvent, ReportId, ReportStatus, Transaction, TransactionKind, UserId,
};
use crate::error::GatewayError;
use crate::persistence::{Store, StoredReport};

/// Ledger description for report earnings.
const REPORT_DESCRIPTION: &str = "Points earned for reporting waste";
/// Ledger description for collection earnings.
const COLLECT_DESCRIPTION: &str = "Points earned for collecting waste";

/// Orchestration layer for reports and collection tasks.
#[derive(Debug, Clone)]
pub struct CollectionService {
    store: Arc<dyn Store>,
    ledger: Arc<RewardLedger>,
    event_bus: EventBus,
    report_reward_points: i64,
    collect_reward_points: i64,
}

impl CollectionService {
    /// Creates a new `CollectionService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        ledger: Arc<RewardLedger>,
        event_bus: EventBus,
        report_reward_points: i64,
        collect_reward_points: i64,
    ) -> Self {
        Self {
            store,
            ledger,
            event_bus,
            report_reward_points,
            collect_reward_points,
        }
    }

    /// Persists a new waste report and awards the reporting reward.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] if a required field is empty.
    /// - [`GatewayError::UserNotFound`] if the reporter does not exist.
    /// - [`GatewayError::PersistenceError`] on storage failure.
    pub async fn submit_report(
        &self,
        user_id: UserId,
        location: &str,
        waste_type: &str,
        amount: &str,
        image_url: Option<&str>,
    ) -> Result<StoredReport, GatewayError> {
        for (field, value) in [
            ("location", location),
            ("waste_type", waste_type),
            ("amount", amount),
        ] {
            if value.trim().is_empty() {
                return Err(GatewayError::InvalidRequest(format!(
                    "{field} must not be empty"
                )));
            }
        }

        let report = self
            .store
            .insert_report(user_id, location, waste_type, amount, image_url)
            .await?;

        self.ledger
            .record_earning(
                user_id,
                TransactionKind::EarnedReport,
                self.report_reward_points,
                REPORT_DESCRIPTION,
            )
            .await?;

        let _ = self.event_bus.publish(LedgerEvent::ReportStatusChanged {
            report_id: report.id,
            status: report.status,
            collector_id: None,
            timestamp: Utc::now(),
        });

        tracing::info!(report_id = %report.id, user_id = %user_id, "report submitted");
        Ok(report)
    }

    /// Loads one page of reports, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    pub async fn reports_page(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<StoredReport>, u32), GatewayError> {
        self.store.reports_page(limit, offset).await
    }

    /// Claims or advances a collection task.
    ///
    /// Claiming (`pending → in_progress`) records the collector; an
    /// abandoned claim (`in_progress → pending`) clears it. Moving to
    /// `verified` is rejected here: verification goes through
    /// [`Self::verify_collection`] so the reward cannot be skipped.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::ReportNotFound`] if the report does not exist.
    /// - [`GatewayError::InvalidRequest`] for a disallowed transition
    ///   or a collector that does not hold the claim.
    /// - [`GatewayError::PersistenceError`] on storage failure.
    pub async fn update_status(
        &self,
        report_id: ReportId,
        new_status: ReportStatus,
        collector: UserId,
    ) -> Result<StoredReport, GatewayError> {
        if new_status == ReportStatus::Verified {
            return Err(GatewayError::InvalidRequest(
                "verification requires the verify endpoint".to_string(),
            ));
        }

        let report = self
            .store
            .report_by_id(report_id)
            .await?
            .ok_or(GatewayError::ReportNotFound(report_id))?;

        if !report.status.can_transition(new_status) {
            return Err(GatewayError::InvalidRequest(format!(
                "cannot move report from {} to {}",
                report.status, new_status
            )));
        }
        if report.status != ReportStatus::Pending && report.collector_id != Some(collector) {
            return Err(GatewayError::InvalidRequest(
                "task is claimed by another collector".to_string(),
            ));
        }

        let collector_id = match new_status {
            ReportStatus::Pending => None,
            _ => Some(collector),
        };
        let updated = self
            .store
            .set_report_status(report_id, new_status, collector_id)
            .await?;

        let _ = self.event_bus.publish(LedgerEvent::ReportStatusChanged {
            report_id,
            status: updated.status,
            collector_id,
            timestamp: Utc::now(),
        });

        tracing::info!(report_id = %report_id, status = %new_status, "task status updated");
        Ok(updated)
    }

    /// Verifies a collection and awards the collector's reward.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::ReportNotFound`] if the report does not exist.
    /// - [`GatewayError::InvalidRequest`] if the task is not in a
    ///   verifiable state or the caller does not hold the claim.
    /// - [`GatewayError::PersistenceError`] on storage failure.
    pub async fn verify_collection(
        &self,
        report_id: ReportId,
        collector: UserId,
    ) -> Result<(StoredReport, Transaction), GatewayError> {
        let report = self
            .store
            .report_by_id(report_id)
            .await?
            .ok_or(GatewayError::ReportNotFound(report_id))?;

        if !report.status.can_transition(ReportStatus::Verified) {
            return Err(GatewayError::InvalidRequest(format!(
                "cannot verify a report in status {}",
                report.status
            )));
        }
        if report.collector_id != Some(collector) {
            return Err(GatewayError::InvalidRequest(
                "task is claimed by another collector".to_string(),
            ));
        }

        let updated = self
            .store
            .set_report_status(report_id, ReportStatus::Verified, Some(collector))
            .await?;

        let tx = self
            .ledger
            .record_earning(
                collector,
                TransactionKind::EarnedCollect,
                self.collect_reward_points,
                COLLECT_DESCRIPTION,
            )
            .await?;

        let _ = self.event_bus.publish(LedgerEvent::ReportStatusChanged {
            report_id,
            status: ReportStatus::Verified,
            collector_id: Some(collector),
            timestamp: Utc::now(),
        });

        tracing::info!(report_id = %report_id, collector = %collector, "collection verified");
        Ok((updated, tx))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::EventBus;
    use crate::persistence::MemoryStore;

    struct Fixture {
        service: CollectionService,
        ledger: Arc<RewardLedger>,
        store: Arc<MemoryStore>,
    }

    fn make_fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let bus = EventBus::new(64);
        let ledger = Arc::new(RewardLedger::new(
            Arc::clone(&store) as Arc<dyn Store>,
            bus.clone(),
        ));
        let service = CollectionService::new(
            Arc::clone(&store) as Arc<dyn Store>,
            Arc::clone(&ledger),
            bus,
            10,
            25,
        );
        Fixture {
            service,
            ledger,
            store,
        }
    }

    async fn make_user(store: &MemoryStore, email: &str) -> UserId {
        let Ok(user) = store.get_or_create_user(email, "Test User").await else {
            panic!("user creation failed");
        };
        user.id
    }

    #[tokio::test]
    async fn submitting_a_report_awards_points_and_seeds_a_task() {
        let fx = make_fixture();
        let reporter = make_user(&fx.store, "r@example.org").await;

        let report = fx
            .service
            .submit_report(reporter, "Main St & 5th", "plastic", "5 kg", None)
            .await;
        let Ok(report) = report else {
            panic!("submit failed");
        };
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(fx.ledger.balance(reporter).await.ok(), Some(10));
    }

    #[tokio::test]
    async fn empty_fields_are_rejected() {
        let fx = make_fixture();
        let reporter = make_user(&fx.store, "r@example.org").await;
        let result = fx
            .service
            .submit_report(reporter, "", "plastic", "5 kg", None)
            .await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn claim_then_verify_awards_the_collector() {
        let fx = make_fixture();
        let reporter = make_user(&fx.store, "r@example.org").await;
        let collector = make_user(&fx.store, "c@example.org").await;

        let Ok(report) = fx
            .service
            .submit_report(reporter, "Main St", "glass", "2 kg", None)
            .await
        else {
            panic!("submit failed");
        };

        let claimed = fx
            .service
            .update_status(report.id, ReportStatus::InProgress, collector)
            .await;
        let Ok(claimed) = claimed else {
            panic!("claim failed");
        };
        assert_eq!(claimed.collector_id, Some(collector));

        let verified = fx.service.verify_collection(report.id, collector).await;
        let Ok((updated, tx)) = verified else {
            panic!("verify failed");
        };
        assert_eq!(updated.status, ReportStatus::Verified);
        assert_eq!(tx.amount, 25);
        assert_eq!(fx.ledger.balance(collector).await.ok(), Some(25));
    }

    #[tokio::test]
    async fn only_the_claiming_collector_can_verify() {
        let fx = make_fixture();
        let reporter = make_user(&fx.store, "r@example.org").await;
        let collector = make_user(&fx.store, "c@example.org").await;
        let intruder = make_user(&fx.store, "x@example.org").await;

        let Ok(report) = fx
            .service
            .submit_report(reporter, "Main St", "glass", "2 kg", None)
            .await
        else {
            panic!("submit failed");
        };
        let _ = fx
            .service
            .update_status(report.id, ReportStatus::InProgress, collector)
            .await;

        let result = fx.service.verify_collection(report.id, intruder).await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn verifying_twice_is_rejected() {
        let fx = make_fixture();
        let reporter = make_user(&fx.store, "r@example.org").await;
        let collector = make_user(&fx.store, "c@example.org").await;

        let Ok(report) = fx
            .service
            .submit_report(reporter, "Main St", "glass", "2 kg", None)
            .await
        else {
            panic!("submit failed");
        };
        let _ = fx
            .service
            .update_status(report.id, ReportStatus::InProgress, collector)
            .await;
        let _ = fx.service.verify_collection(report.id, collector).await;

        let again = fx.service.verify_collection(report.id, collector).await;
        assert!(matches!(again, Err(GatewayError::InvalidRequest(_))));
        // The collect reward was granted exactly once.
        assert_eq!(fx.ledger.balance(collector).await.ok(), Some(25));
    }

    #[tokio::test]
    async fn verified_status_is_unreachable_through_update() {
        let fx = make_fixture();
        let reporter = make_user(&fx.store, "r@example.org").await;
        let collector = make_user(&fx.store, "c@example.org").await;

        let Ok(report) = fx
            .service
            .submit_report(reporter, "Main St", "glass", "2 kg", None)
            .await
        else {
            panic!("submit failed");
        };
        let result = fx
            .service
            .update_status(report.id, ReportStatus::Verified, collector)
            .await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn pending_tasks_cannot_be_verified() {
        let fx = make_fixture();
        let reporter = make_user(&fx.store, "r@example.org").await;
        let collector = make_user(&fx.store, "c@example.org").await;

        let Ok(report) = fx
            .service
            .submit_report(reporter, "Main St", "glass", "2 kg", None)
            .await
        else {
            panic!("submit failed");
        };
        let result = fx.service.verify_collection(report.id, collector).await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn abandoning_a_claim_clears_the_collector() {
        let fx = make_fixture();
        let reporter = make_user(&fx.store, "r@example.org").await;
        let collector = make_user(&fx.store, "c@example.org").await;

        let Ok(report) = fx
            .service
            .submit_report(reporter, "Main St", "glass", "2 kg", None)
            .await
        else {
            panic!("submit failed");
        };
        let _ = fx
            .service
            .update_status(report.id, ReportStatus::InProgress, collector)
            .await;
        let back = fx
            .service
            .update_status(report.id, ReportStatus::Pending, collector)
            .await;
        let Ok(back) = back else {
            panic!("abandon failed");
        };
        assert_eq!(back.collector_id, None);
        assert_eq!(back.status, ReportStatus::Pending);
    }
}
