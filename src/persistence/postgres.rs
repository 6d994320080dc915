//! PostgreSQL implementation of the persistence layer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use async_trait::async_trait;

use super::Store;
use super::models::{StoredCatalogReward, StoredReport, StoredReward, StoredUser};
use crate::domain::{
    ReportId, ReportStatus, RewardId, Transaction, TransactionId, TransactionKind, UserId, ledger,
};
use crate::error::GatewayError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

/// Raw user tuple as selected from the `users` table.
type UserTuple = (i64, Option<String>, String, Option<String>, DateTime<Utc>);

/// Raw report tuple as selected from the `reports` table.
type ReportTuple = (
    i64,
    i64,
    String,
    String,
    String,
    Option<String>,
    String,
    Option<i64>,
    DateTime<Utc>,
    DateTime<Utc>,
);

const USER_COLUMNS: &str = "id, email, name, wallet_address, created_at";
const REPORT_COLUMNS: &str =
    "id, user_id, location, waste_type, amount, image_url, status, collector_id, created_at, updated_at";

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn user_from_tuple(row: UserTuple) -> StoredUser {
        let (id, email, name, wallet_address, created_at) = row;
        StoredUser {
            id: UserId::new(id),
            email,
            name,
            wallet_address,
            created_at,
        }
    }

    fn report_from_tuple(row: ReportTuple) -> Result<StoredReport, GatewayError> {
        let (
            id,
            user_id,
            location,
            waste_type,
            amount,
            image_url,
            status,
            collector_id,
            created_at,
            updated_at,
        ) = row;
        Ok(StoredReport {
            id: ReportId::new(id),
            user_id: UserId::new(user_id),
            location,
            waste_type,
            amount,
            image_url,
            status: ReportStatus::try_from(status.as_str())?,
            collector_id: collector_id.map(UserId::new),
            created_at,
            updated_at,
        })
    }

    fn transaction_from_tuple(
        row: (i64, i64, String, i64, String, DateTime<Utc>),
    ) -> Result<Transaction, GatewayError> {
        let (id, user_id, kind, amount, description, created_at) = row;
        Ok(Transaction {
            id: TransactionId::new(id),
            user_id: UserId::new(user_id),
            kind: TransactionKind::try_from(kind.as_str())?,
            amount,
            description,
            created_at,
        })
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn get_or_create_user(
        &self,
        email: &str,
        name: &str,
    ) -> Result<StoredUser, GatewayError> {
        let row = sqlx::query_as::<_, UserTuple>(
            "INSERT INTO users (email, name) VALUES ($1, $2) \
             ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email \
             RETURNING id, email, name, wallet_address, created_at",
        )
        .bind(email)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(Self::user_from_tuple(row))
    }

    async fn get_or_create_wallet_user(&self, address: &str) -> Result<StoredUser, GatewayError> {
        // Display name defaults to a shortened address prefix.
        let name = format!("wallet-{}", address.chars().take(8).collect::<String>());
        let row = sqlx::query_as::<_, UserTuple>(
            "INSERT INTO users (name, wallet_address) VALUES ($1, $2) \
             ON CONFLICT (wallet_address) DO UPDATE SET wallet_address = EXCLUDED.wallet_address \
             RETURNING id, email, name, wallet_address, created_at",
        )
        .bind(name)
        .bind(address)
        .fetch_one(&self.pool)
        .await?;

        Ok(Self::user_from_tuple(row))
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<StoredUser>, GatewayError> {
        let row = sqlx::query_as::<_, UserTuple>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::user_from_tuple))
    }

    async fn create_session(&self, user_id: UserId) -> Result<Uuid, GatewayError> {
        let token = Uuid::new_v4();
        sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
            .bind(token)
            .bind(user_id.get())
            .execute(&self.pool)
            .await?;
        Ok(token)
    }

    async fn user_for_session(&self, token: Uuid) -> Result<Option<StoredUser>, GatewayError> {
        let row = sqlx::query_as::<_, UserTuple>(
            "SELECT u.id, u.email, u.name, u.wallet_address, u.created_at \
             FROM users u JOIN sessions s ON s.user_id = u.id WHERE s.token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::user_from_tuple))
    }

    async fn append_transaction(
        &self,
        user_id: UserId,
        kind: TransactionKind,
        amount: i64,
        description: &str,
    ) -> Result<Transaction, GatewayError> {
        let (id, created_at) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            "INSERT INTO transactions (user_id, kind, amount, description) \
             VALUES ($1, $2, $3, $4) RETURNING id, created_at",
        )
        .bind(user_id.get())
        .bind(kind.as_str())
        .bind(amount)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(Transaction {
            id: TransactionId::new(id),
            user_id,
            kind,
            amount,
            description: description.to_string(),
            created_at,
        })
    }

    async fn transactions_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Transaction>, GatewayError> {
        let rows = sqlx::query_as::<_, (i64, i64, String, i64, String, DateTime<Utc>)>(
            "SELECT id, user_id, kind, amount, description, created_at \
             FROM transactions WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::transaction_from_tuple).collect()
    }

    async fn redeem(
        &self,
        user_id: UserId,
        reward: Option<&StoredCatalogReward>,
    ) -> Result<Transaction, GatewayError> {
        let mut db_tx = self.pool.begin().await?;

        // Serialize concurrent redemptions for the same user on the
        // user row; the balance check below is then race-free.
        let locked = sqlx::query_as::<_, (i64,)>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id.get())
            .fetch_optional(&mut *db_tx)
            .await?;
        if locked.is_none() {
            return Err(GatewayError::UserNotFound(user_id));
        }

        let rows = sqlx::query_as::<_, (i64, i64, String, i64, String, DateTime<Utc>)>(
            "SELECT id, user_id, kind, amount, description, created_at \
             FROM transactions WHERE user_id = $1",
        )
        .bind(user_id.get())
        .fetch_all(&mut *db_tx)
        .await?;
        let history: Vec<Transaction> = rows
            .into_iter()
            .map(Self::transaction_from_tuple)
            .collect::<Result<_, _>>()?;
        let available = ledger::spendable_balance(&history);

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

        let (id, created_at) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            "INSERT INTO transactions (user_id, kind, amount, description) \
             VALUES ($1, $2, $3, $4) RETURNING id, created_at",
        )
        .bind(user_id.get())
        .bind(TransactionKind::Redeemed.as_str())
        .bind(cost)
        .bind(&description)
        .fetch_one(&mut *db_tx)
        .await?;

        // Keep the denormalized aggregate in step, floored at zero.
        sqlx::query(
            "UPDATE rewards SET points = GREATEST(points - $2, 0), updated_at = now() \
             WHERE user_id = $1",
        )
        .bind(user_id.get())
        .bind(cost)
        .execute(&mut *db_tx)
        .await?;

        db_tx.commit().await?;

        Ok(Transaction {
            id: TransactionId::new(id),
            user_id,
            kind: TransactionKind::Redeemed,
            amount: cost,
            description,
            created_at,
        })
    }

    async fn add_reward_points(
        &self,
        user_id: UserId,
        delta: i64,
        user_name: &str,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO rewards (user_id, points, level, user_name) VALUES ($1, $2, 1, $3) \
             ON CONFLICT (user_id) DO UPDATE \
             SET points = rewards.points + EXCLUDED.points, updated_at = now()",
        )
        .bind(user_id.get())
        .bind(delta)
        .bind(user_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reward_rows(&self) -> Result<Vec<StoredReward>, GatewayError> {
        let rows = sqlx::query_as::<
            _,
            (
                i64,
                i64,
                i64,
                i32,
                Option<String>,
                DateTime<Utc>,
                DateTime<Utc>,
            ),
        >(
            "SELECT id, user_id, points, level, user_name, created_at, updated_at \
             FROM rewards ORDER BY points DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, user_id, points, level, user_name, created_at, updated_at)| StoredReward {
                    id,
                    user_id: UserId::new(user_id),
                    points,
                    level,
                    user_name,
                    created_at,
                    updated_at,
                },
            )
            .collect())
    }

    async fn catalog_reward(
        &self,
        id: RewardId,
    ) -> Result<Option<StoredCatalogReward>, GatewayError> {
        let row = sqlx::query_as::<_, (i64, String, i64, String, String)>(
            "SELECT id, name, cost, description, collection_info \
             FROM catalog_rewards WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, name, cost, description, collection_info)| StoredCatalogReward {
                id: RewardId::new(id),
                name,
                cost,
                description,
                collection_info,
            },
        ))
    }

    async fn available_rewards(&self) -> Result<Vec<StoredCatalogReward>, GatewayError> {
        let rows = sqlx::query_as::<_, (i64, String, i64, String, String)>(
            "SELECT id, name, cost, description, collection_info \
             FROM catalog_rewards WHERE cost > 0 ORDER BY cost ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, name, cost, description, collection_info)| StoredCatalogReward {
                    id: RewardId::new(id),
                    name,
                    cost,
                    description,
                    collection_info,
                },
            )
            .collect())
    }

    async fn insert_report(
        &self,
        user_id: UserId,
        location: &str,
        waste_type: &str,
        amount: &str,
        image_url: Option<&str>,
    ) -> Result<StoredReport, GatewayError> {
        let row = sqlx::query_as::<_, ReportTuple>(&format!(
            "INSERT INTO reports (user_id, location, waste_type, amount, image_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {REPORT_COLUMNS}"
        ))
        .bind(user_id.get())
        .bind(location)
        .bind(waste_type)
        .bind(amount)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await?;

        Self::report_from_tuple(row)
    }

    async fn reports_page(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<StoredReport>, u32), GatewayError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reports")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ReportTuple>(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let reports = rows
            .into_iter()
            .map(Self::report_from_tuple)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((reports, u32::try_from(total).unwrap_or(u32::MAX)))
    }

    async fn report_by_id(&self, id: ReportId) -> Result<Option<StoredReport>, GatewayError> {
        let row = sqlx::query_as::<_, ReportTuple>(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::report_from_tuple).transpose()
    }

    async fn set_report_status(
        &self,
        id: ReportId,
        status: ReportStatus,
        collector_id: Option<UserId>,
    ) -> Result<StoredReport, GatewayError> {
        let row = sqlx::query_as::<_, ReportTuple>(&format!(
            "UPDATE reports SET status = $2, collector_id = $3, updated_at = now() \
             WHERE id = $1 RETURNING {REPORT_COLUMNS}"
        ))
        .bind(id.get())
        .bind(status.as_str())
        .bind(collector_id.map(|c| c.get()))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::report_from_tuple(row),
            None => Err(GatewayError::ReportNotFound(id)),
        }
    }
}
