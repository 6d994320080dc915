//! Domain layer: ledger math, leaderboard aggregation, and events.
//!
//! This module contains the pure business rules of the reward system:
//! typed identifiers, the append-only transaction model with its
//! balance fold, leaderboard standings, the collection lifecycle, and
//! the event bus carrying domain events to external subscribers.

pub mod event;
pub mod event_bus;
pub mod ids;
pub mod leaderboard;
pub mod ledger;
pub mod report_status;
pub mod transaction;

pub use event::LedgerEvent;
pub use event_bus::EventBus;
pub use ids::{ReportId, RewardId, TransactionId, UserId};
pub use leaderboard::Standing;
pub use report_status::ReportStatus;
pub use transaction::{Transaction, TransactionKind};
