//! In-process implementation of the persistence layer.
//!
//! Backs the service-layer unit tests and local development without a
//! PostgreSQL instance. A single [`tokio::sync::Mutex`] guards the
//! whole state, so every operation is trivially atomic, including the
//! redeem check-and-append.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::Store;
use super::models::{StoredCatalogReward, StoredReport, StoredReward, StoredUser};
use crate::domain::{
    ReportId, ReportStatus, RewardId, Transaction, TransactionId, TransactionKind, UserId, ledger,
};
use crate::error::GatewayError;

#[derive(Debug, Default)]
struct Inner {
    users: Vec<StoredUser>,
    sessions: HashMap<Uuid, UserId>,
    transactions: Vec<Transaction>,
    rewards: Vec<StoredReward>,
    catalog: Vec<StoredCatalogReward>,
    reports: Vec<StoredReport>,
    next_id: i64,
}

impl Inner {
    fn next(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Mutex-guarded in-memory [`Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a catalog entry, returning it with its assigned id.
    pub async fn seed_catalog(
        &self,
        name: &str,
        cost: i64,
        description: &str,
        collection_info: &str,
    ) -> StoredCatalogReward {
        let mut inner = self.inner.lock().await;
        let entry = StoredCatalogReward {
            id: RewardId::new(inner.next()),
            name: name.to_string(),
            cost,
            description: description.to_string(),
            collection_info: collection_info.to_string(),
        };
        inner.catalog.push(entry.clone());
        entry
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_or_create_user(
        &self,
        email: &str,
        name: &str,
    ) -> Result<StoredUser, GatewayError> {
        let mut inner = self.inner.lock().await;
        if let Some(user) = inner
            .users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
        {
            return Ok(user.clone());
        }
        let user = StoredUser {
            id: UserId::new(inner.next()),
            email: Some(email.to_string()),
            name: name.to_string(),
            wallet_address: None,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn get_or_create_wallet_user(&self, address: &str) -> Result<StoredUser, GatewayError> {
        let mut inner = self.inner.lock().await;
        if let Some(user) = inner
            .users
            .iter()
            .find(|u| u.wallet_address.as_deref() == Some(address))
        {
            return Ok(user.clone());
        }
        let user = StoredUser {
            id: UserId::new(inner.next()),
            email: None,
            name: format!("wallet-{}", address.chars().take(8).collect::<String>()),
            wallet_address: Some(address.to_string()),
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<StoredUser>, GatewayError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_session(&self, user_id: UserId) -> Result<Uuid, GatewayError> {
        let mut inner = self.inner.lock().await;
        let token = Uuid::new_v4();
        inner.sessions.insert(token, user_id);
        Ok(token)
    }

    async fn user_for_session(&self, token: Uuid) -> Result<Option<StoredUser>, GatewayError> {
        let inner = self.inner.lock().await;
        let Some(user_id) = inner.sessions.get(&token).copied() else {
            return Ok(None);
        };
        Ok(inner.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn append_transaction(
        &self,
        user_id: UserId,
        kind: TransactionKind,
        amount: i64,
        description: &str,
    ) -> Result<Transaction, GatewayError> {
        let mut inner = self.inner.lock().await;
        let tx = Transaction {
            id: TransactionId::new(inner.next()),
            user_id,
            kind,
            amount,
            description: description.to_string(),
            created_at: Utc::now(),
        };
        inner.transactions.push(tx.clone());
        Ok(tx)
    }

    async fn transactions_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Transaction>, GatewayError> {
        let inner = self.inner.lock().await;
        let mut history: Vec<Transaction> = inner
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.get().cmp(&a.id.get()))
        });
        Ok(history)
    }

    async fn redeem(
        &self,
        user_id: UserId,
        reward: Option<&StoredCatalogReward>,
    ) -> Result<Transaction, GatewayError> {
        let mut inner = self.inner.lock().await;
        if !inner.users.iter().any(|u| u.id == user_id) {
            return Err(GatewayError::UserNotFound(user_id));
        }

        let available =
            ledger::spendable_balance(inner.transactions.iter().filter(|t| t.user_id == user_id));

        let (cost, description) = match reward {
            Some(entry) => (entry.cost, format!("Redeemed {}", entry.name)),
            None => {
                if available == 0 {
                    return Err(GatewayError::InvalidRequest(
                        "no points available to redeem".to_string(),
                    ));
                }
                (available, "Redeemed all points".to_string())
            }
        };
        if available < cost {
            return Err(GatewayError::InsufficientBalance {
                required: cost,
                available,
            });
        }

        let tx = Transaction {
            id: TransactionId::new(inner.next()),
            user_id,
            kind: TransactionKind::Redeemed,
            amount: cost,
            description,
            created_at: Utc::now(),
        };
        inner.transactions.push(tx.clone());
        if let Some(row) = inner.rewards.iter_mut().find(|r| r.user_id == user_id) {
            row.points = row.points.saturating_sub(cost).max(0);
            row.updated_at = Utc::now();
        }
        Ok(tx)
    }

    async fn add_reward_points(
        &self,
        user_id: UserId,
        delta: i64,
        user_name: &str,
    ) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().await;
        if let Some(row) = inner.rewards.iter_mut().find(|r| r.user_id == user_id) {
            row.points = row.points.saturating_add(delta);
            row.updated_at = Utc::now();
            return Ok(());
        }
        let now = Utc::now();
        let row = StoredReward {
            id: inner.next(),
            user_id,
            points: delta,
            level: 1,
            user_name: Some(user_name.to_string()),
            created_at: now,
            updated_at: now,
        };
        inner.rewards.push(row);
        Ok(())
    }

    async fn reward_rows(&self) -> Result<Vec<StoredReward>, GatewayError> {
        let inner = self.inner.lock().await;
        Ok(inner.rewards.clone())
    }

    async fn catalog_reward(
        &self,
        id: RewardId,
    ) -> Result<Option<StoredCatalogReward>, GatewayError> {
        let inner = self.inner.lock().await;
        Ok(inner.catalog.iter().find(|c| c.id == id).cloned())
    }

    async fn available_rewards(&self) -> Result<Vec<StoredCatalogReward>, GatewayError> {
        let inner = self.inner.lock().await;
        let mut entries: Vec<StoredCatalogReward> = inner
            .catalog
            .iter()
            .filter(|c| c.cost > 0)
            .cloned()
            .collect();
        entries.sort_by_key(|c| c.cost);
        Ok(entries)
    }

    async fn insert_report(
        &self,
        user_id: UserId,
        location: &str,
        waste_type: &str,
        amount: &str,
        image_url: Option<&str>,
    ) -> Result<StoredReport, GatewayError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let report = StoredReport {
            id: ReportId::new(inner.next()),
            user_id,
            location: location.to_string(),
            waste_type: waste_type.to_string(),
            amount: amount.to_string(),
            image_url: image_url.map(str::to_string),
            status: ReportStatus::Pending,
            collector_id: None,
            created_at: now,
            updated_at: now,
        };
        inner.reports.push(report.clone());
        Ok(report)
    }

    async fn reports_page(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<StoredReport>, u32), GatewayError> {
        let inner = self.inner.lock().await;
        let mut all: Vec<StoredReport> = inner.reports.clone();
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.get().cmp(&a.id.get()))
        });
        let total = u32::try_from(all.len()).unwrap_or(u32::MAX);
        let page = all
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect();
        Ok((page, total))
    }

    async fn report_by_id(&self, id: ReportId) -> Result<Option<StoredReport>, GatewayError> {
        let inner = self.inner.lock().await;
        Ok(inner.reports.iter().find(|r| r.id == id).cloned())
    }

    async fn set_report_status(
        &self,
        id: ReportId,
        status: ReportStatus,
        collector_id: Option<UserId>,
    ) -> Result<StoredReport, GatewayError> {
        let mut inner = self.inner.lock().await;
        let Some(report) = inner.reports.iter_mut().find(|r| r.id == id) else {
            return Err(GatewayError::ReportNotFound(id));
        };
        report.status = status;
        report.collector_id = collector_id;
        report.updated_at = Utc::now();
        Ok(report.clone())
    }
}
