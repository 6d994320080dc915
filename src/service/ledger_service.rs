//! Reward ledger service: earning, balance, redemption, leaderboard.
//!
//! Orchestrates the append-only transaction history and the
//! denormalized reward aggregate. Every method takes an explicit,
//! already-resolved user id; identity never leaks below the handler
//! layer. Mutations publish a [`LedgerEvent`] for external subscribers.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::leaderboard::{Standing, aggregate_standings};
use crate::domain::{EventBus, LedgerEvent, RewardId, Transaction, TransactionKind, UserId, ledger};
use crate::error::GatewayError;
use crate::persistence::{Store, StoredCatalogReward};

/// Orchestration layer for all reward-point operations.
///
/// Stateless coordinator: owns a handle to the [`Store`] for state and
/// the [`EventBus`] for event emission. The spendable balance is never
/// cached; it is recomputed from the full history on every read.
#[derive(Debug, Clone)]
pub struct RewardLedger {
    store: Arc<dyn Store>,
    event_bus: EventBus,
}

impl RewardLedger {
    /// Creates a new `RewardLedger`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Appends an earning transaction and bumps the reward aggregate.
    ///
    /// The aggregate upsert is deliberately a separate storage call:
    /// the running `points` column and the transaction-derived balance
    /// are independent representations with independent update paths.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] if `kind` is not an earning
    ///   kind.
    /// - [`GatewayError::InvalidAmount`] if `amount` is not positive.
    /// - [`GatewayError::UserNotFound`] if the user does not exist.
    /// - [`GatewayError::PersistenceError`] on storage failure.
    pub async fn record_earning(
        &self,
        user_id: UserId,
        kind: TransactionKind,
        amount: i64,
        description: &str,
    ) -> Result<Transaction, GatewayError> {
        if !kind.is_earning() {
            return Err(GatewayError::InvalidRequest(
                "record_earning requires an earning kind".to_string(),
            ));
        }
        if amount <= 0 {
            return Err(GatewayError::InvalidAmount(amount));
        }
        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or(GatewayError::UserNotFound(user_id))?;

        let tx = self
            .store
            .append_transaction(user_id, kind, amount, description)
            .await?;
        self.store
            .add_reward_points(user_id, amount, &user.name)
            .await?;

        let _ = self.event_bus.publish(LedgerEvent::PointsEarned {
            user_id,
            kind,
            amount,
            description: description.to_string(),
            timestamp: Utc::now(),
        });

        tracing::info!(user_id = %user_id, kind = %kind, amount, "points earned");
        Ok(tx)
    }

    /// Computes the spendable balance from the full history.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    pub async fn balance(&self, user_id: UserId) -> Result<i64, GatewayError> {
        let history = self.store.transactions_for_user(user_id).await?;
        Ok(ledger::spendable_balance(&history))
    }

    /// Loads a user's transaction history, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    pub async fn transactions(&self, user_id: UserId) -> Result<Vec<Transaction>, GatewayError> {
        self.store.transactions_for_user(user_id).await
    }

    /// Redeems a catalog reward, or the entire balance for the
    /// [`RewardId::REDEEM_ALL`] sentinel.
    ///
    /// The balance check and the redemption append run atomically in
    /// the store, serialized on the user's row, so two concurrent
    /// redemptions cannot both spend the same points.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::RewardNotFound`] if the id names no catalog
    ///   entry with a positive cost.
    /// - [`GatewayError::UserNotFound`] if the user does not exist.
    /// - [`GatewayError::InsufficientBalance`] if the balance does not
    ///   cover the cost; nothing is appended.
    /// - [`GatewayError::InvalidRequest`] for the sentinel with an
    ///   empty balance.
    /// - [`GatewayError::PersistenceError`] on storage failure.
    pub async fn redeem(
        &self,
        user_id: UserId,
        reward_id: RewardId,
    ) -> Result<Transaction, GatewayError> {
        let entry: Option<StoredCatalogReward> = if reward_id.is_redeem_all() {
            None
        } else {
            let entry = self
                .store
                .catalog_reward(reward_id)
                .await?
                .filter(|e| e.cost > 0)
                .ok_or(GatewayError::RewardNotFound(reward_id))?;
            Some(entry)
        };

        let tx = self.store.redeem(user_id, entry.as_ref()).await?;

        let _ = self.event_bus.publish(LedgerEvent::PointsRedeemed {
            user_id,
            amount: tx.amount,
            description: tx.description.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(user_id = %user_id, amount = tx.amount, "points redeemed");
        Ok(tx)
    }

    /// Lists catalog entries redeemable for points.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    pub async fn available_rewards(&self) -> Result<Vec<StoredCatalogReward>, GatewayError> {
        self.store.available_rewards().await
    }

    /// Returns the ranked leaderboard standings.
    ///
    /// Standings derive from the denormalized reward aggregate, not
    /// from the transaction ledger.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    pub async fn leaderboard(&self) -> Result<Vec<Standing>, GatewayError> {
        let rows = self.store.reward_rows().await?;
        Ok(aggregate_standings(rows.into_iter().map(|r| Standing {
            user_id: r.user_id,
            points: r.points,
            level: r.level,
            user_name: r.user_name,
        })))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    async fn make_ledger() -> (RewardLedger, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let ledger = RewardLedger::new(Arc::clone(&store) as Arc<dyn Store>, EventBus::new(64));
        (ledger, store)
    }

    async fn make_user(store: &MemoryStore, email: &str) -> UserId {
        let Ok(user) = store.get_or_create_user(email, "Test User").await else {
            panic!("user creation failed");
        };
        user.id
    }

    #[tokio::test]
    async fn earnings_accumulate_into_balance() {
        let (ledger, store) = make_ledger().await;
        let user = make_user(&store, "a@example.org").await;

        let report = ledger
            .record_earning(
                user,
                TransactionKind::EarnedReport,
                10,
                "Points earned for reporting waste",
            )
            .await;
        assert!(report.is_ok());
        let collect = ledger
            .record_earning(
                user,
                TransactionKind::EarnedCollect,
                15,
                "Points earned for collecting waste",
            )
            .await;
        assert!(collect.is_ok());

        assert_eq!(ledger.balance(user).await.ok(), Some(25));
    }

    #[tokio::test]
    async fn earning_emits_event() {
        let (ledger, store) = make_ledger().await;
        let user = make_user(&store, "a@example.org").await;
        let mut rx = ledger.event_bus().subscribe();

        let _ = ledger
            .record_earning(user, TransactionKind::EarnedReport, 10, "desc")
            .await;

        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "points_earned");
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected() {
        let (ledger, store) = make_ledger().await;
        let user = make_user(&store, "a@example.org").await;

        for amount in [0, -5] {
            let result = ledger
                .record_earning(user, TransactionKind::EarnedReport, amount, "desc")
                .await;
            assert!(matches!(result, Err(GatewayError::InvalidAmount(_))));
        }
        let Ok(history) = ledger.transactions(user).await else {
            panic!("history read failed");
        };
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn redeemed_kind_is_not_an_earning() {
        let (ledger, store) = make_ledger().await;
        let user = make_user(&store, "a@example.org").await;
        let result = ledger
            .record_earning(user, TransactionKind::Redeemed, 10, "desc")
            .await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn unknown_user_cannot_earn() {
        let (ledger, _store) = make_ledger().await;
        let result = ledger
            .record_earning(UserId::new(999), TransactionKind::EarnedReport, 10, "desc")
            .await;
        assert!(matches!(result, Err(GatewayError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn redeeming_a_catalog_reward_appends_and_decrements() {
        let (ledger, store) = make_ledger().await;
        let user = make_user(&store, "a@example.org").await;
        let entry = store.seed_catalog("Bottle", 30, "", "").await;

        let _ = ledger
            .record_earning(user, TransactionKind::EarnedCollect, 50, "desc")
            .await;

        let tx = ledger.redeem(user, entry.id).await;
        let Ok(tx) = tx else {
            panic!("redeem failed");
        };
        assert_eq!(tx.amount, 30);
        assert_eq!(tx.description, "Redeemed Bottle");
        assert_eq!(ledger.balance(user).await.ok(), Some(20));

        // Aggregate follows with the same floor-at-zero policy.
        let Ok(rows) = store.reward_rows().await else {
            panic!("reward rows read failed");
        };
        let Some(row) = rows.first() else {
            panic!("expected aggregate row");
        };
        assert_eq!(row.points, 20);
    }

    #[tokio::test]
    async fn insufficient_balance_appends_nothing() {
        // Scenario E: cost 40 against balance 25.
        let (ledger, store) = make_ledger().await;
        let user = make_user(&store, "a@example.org").await;
        let entry = store.seed_catalog("Transit Pass", 40, "", "").await;

        let _ = ledger
            .record_earning(user, TransactionKind::EarnedReport, 25, "desc")
            .await;

        let result = ledger.redeem(user, entry.id).await;
        assert!(matches!(
            result,
            Err(GatewayError::InsufficientBalance {
                required: 40,
                available: 25
            })
        ));

        let Ok(history) = ledger.transactions(user).await else {
            panic!("history read failed");
        };
        assert_eq!(history.len(), 1);
        assert_eq!(ledger.balance(user).await.ok(), Some(25));
    }

    #[tokio::test]
    async fn redeem_all_sentinel_empties_the_balance() {
        // Scenario D: sentinel against balance 30.
        let (ledger, store) = make_ledger().await;
        let user = make_user(&store, "a@example.org").await;

        let _ = ledger
            .record_earning(user, TransactionKind::EarnedReport, 30, "desc")
            .await;

        let tx = ledger.redeem(user, RewardId::REDEEM_ALL).await;
        let Ok(tx) = tx else {
            panic!("redeem failed");
        };
        assert_eq!(tx.amount, 30);
        assert_eq!(tx.description, "Redeemed all points");
        assert_eq!(ledger.balance(user).await.ok(), Some(0));
    }

    #[tokio::test]
    async fn redeem_all_with_empty_balance_is_rejected() {
        let (ledger, store) = make_ledger().await;
        let user = make_user(&store, "a@example.org").await;
        let result = ledger.redeem(user, RewardId::REDEEM_ALL).await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn unknown_or_free_rewards_are_not_redeemable() {
        let (ledger, store) = make_ledger().await;
        let user = make_user(&store, "a@example.org").await;
        let free = store.seed_catalog("Sticker", 0, "", "").await;

        let _ = ledger
            .record_earning(user, TransactionKind::EarnedReport, 50, "desc")
            .await;

        let missing = ledger.redeem(user, RewardId::new(999)).await;
        assert!(matches!(missing, Err(GatewayError::RewardNotFound(_))));

        let zero_cost = ledger.redeem(user, free.id).await;
        assert!(matches!(zero_cost, Err(GatewayError::RewardNotFound(_))));
    }

    #[tokio::test]
    async fn redeem_emits_event() {
        let (ledger, store) = make_ledger().await;
        let user = make_user(&store, "a@example.org").await;
        let _ = ledger
            .record_earning(user, TransactionKind::EarnedReport, 30, "desc")
            .await;

        let mut rx = ledger.event_bus().subscribe();
        let _ = ledger.redeem(user, RewardId::REDEEM_ALL).await;

        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "points_redeemed");
    }

    #[tokio::test]
    async fn leaderboard_ranks_by_aggregate_points() {
        let (ledger, store) = make_ledger().await;
        let first = make_user(&store, "a@example.org").await;
        let second = make_user(&store, "b@example.org").await;

        let _ = ledger
            .record_earning(first, TransactionKind::EarnedReport, 10, "desc")
            .await;
        let _ = ledger
            .record_earning(second, TransactionKind::EarnedCollect, 30, "desc")
            .await;
        let _ = ledger
            .record_earning(first, TransactionKind::EarnedCollect, 5, "desc")
            .await;

        let Ok(standings) = ledger.leaderboard().await else {
            panic!("leaderboard failed");
        };
        let flat: Vec<(UserId, i64)> = standings.iter().map(|s| (s.user_id, s.points)).collect();
        assert_eq!(flat, vec![(second, 30), (first, 15)]);
    }
}
