//! Persistence layer: the [`Store`] capability and its backends.
//!
//! The ledger needs three query shapes from storage: append (insert a
//! transaction row), point-aggregate upsert (insert-or-increment), and
//! full-history read by user id. The surrounding flows add user,
//! session, catalog, and report access. [`PostgresStore`] is the
//! production backend; [`MemoryStore`] backs service tests and local
//! development.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use models::{StoredCatalogReward, StoredReport, StoredReward, StoredUser};
pub use postgres::PostgresStore;

use crate::domain::{ReportId, ReportStatus, RewardId, Transaction, TransactionKind, UserId};
use crate::error::GatewayError;

/// Storage capability consumed by the service layer.
///
/// All mutating ledger operations preserve the append-only invariant:
/// no implementation updates or deletes a transaction row.
#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Finds the user with this email, creating one on first sight.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on database failure.
    async fn get_or_create_user(&self, email: &str, name: &str)
    -> Result<StoredUser, GatewayError>;

    /// Finds the user with this wallet address, creating one on first
    /// sight.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on database failure.
    async fn get_or_create_wallet_user(&self, address: &str) -> Result<StoredUser, GatewayError>;

    /// Looks a user up by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on database failure.
    async fn user_by_id(&self, id: UserId) -> Result<Option<StoredUser>, GatewayError>;

    /// Issues a new opaque session token for the user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on database failure.
    async fn create_session(&self, user_id: UserId) -> Result<Uuid, GatewayError>;

    /// Resolves a session token to its user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on database failure.
    async fn user_for_session(&self, token: Uuid) -> Result<Option<StoredUser>, GatewayError>;

    /// Appends one transaction to the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on database failure.
    async fn append_transaction(
        &self,
        user_id: UserId,
        kind: TransactionKind,
        amount: i64,
        description: &str,
    ) -> Result<Transaction, GatewayError>;

    /// Loads a user's full transaction history, newest first.
    ///
    /// The ledger scans the whole history on every balance read; there
    /// is deliberately no paginated variant.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on database failure.
    async fn transactions_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Transaction>, GatewayError>;

    /// Atomically checks the balance and appends a redemption.
    ///
    /// `reward` is `None` for the redeem-all sentinel. The balance
    /// check, the transaction append, and the aggregate decrement all
    /// happen inside one storage transaction serialized on the user's
    /// row, so concurrent redemptions cannot both pass the check.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::UserNotFound`] if the user does not exist.
    /// - [`GatewayError::InsufficientBalance`] if the balance does not
    ///   cover the cost; nothing is appended.
    /// - [`GatewayError::InvalidRequest`] for the sentinel with an
    ///   empty balance.
    /// - [`GatewayError::PersistenceError`] on database failure.
    async fn redeem(
        &self,
        user_id: UserId,
        reward: Option<&StoredCatalogReward>,
    ) -> Result<Transaction, GatewayError>;

    /// Upserts the denormalized reward aggregate for a user.
    ///
    /// Inserts at level 1 on first earn, then atomically adds `delta`
    /// to the running total.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on database failure.
    async fn add_reward_points(
        &self,
        user_id: UserId,
        delta: i64,
        user_name: &str,
    ) -> Result<(), GatewayError>;

    /// Loads all reward aggregate rows.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on database failure.
    async fn reward_rows(&self) -> Result<Vec<StoredReward>, GatewayError>;

    /// Looks a catalog entry up by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on database failure.
    async fn catalog_reward(
        &self,
        id: RewardId,
    ) -> Result<Option<StoredCatalogReward>, GatewayError>;

    /// Lists catalog entries redeemable for points (`cost > 0`).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on database failure.
    async fn available_rewards(&self) -> Result<Vec<StoredCatalogReward>, GatewayError>;

    /// Persists a new waste report (collection status `pending`).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on database failure.
    async fn insert_report(
        &self,
        user_id: UserId,
        location: &str,
        waste_type: &str,
        amount: &str,
        image_url: Option<&str>,
    ) -> Result<StoredReport, GatewayError>;

    /// Loads one page of reports, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on database failure.
    async fn reports_page(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<StoredReport>, u32), GatewayError>;

    /// Looks a report up by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on database failure.
    async fn report_by_id(&self, id: ReportId) -> Result<Option<StoredReport>, GatewayError>;

    /// Updates a report's collection status and collector.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::ReportNotFound`] if the report does not exist.
    /// - [`GatewayError::PersistenceError`] on database failure.
    async fn set_report_status(
        &self,
        id: ReportId,
        status: ReportStatus,
        collector_id: Option<UserId>,
    ) -> Result<StoredReport, GatewayError>;
}
