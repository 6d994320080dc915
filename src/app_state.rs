//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::identity::IdentityProvider;
use crate::service::{CollectionService, RewardLedger};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Reward ledger service: earning, balance, redemption, leaderboard.
    pub ledger: Arc<RewardLedger>,
    /// Report and collection-task service.
    pub collection: Arc<CollectionService>,
    /// Identity provider selected by deployment configuration.
    pub identity: Arc<dyn IdentityProvider>,
    /// Event bus for external notification subscribers.
    pub event_bus: EventBus,
}
