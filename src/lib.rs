//! # ecotrack-gateway
//!
//! REST API gateway for the EcoTrack community waste-management
//! platform.
//!
//! Users report waste sightings, collectors claim and verify
//! collection tasks, and both earn point rewards redeemable against a
//! catalog. The core of the service is the reward ledger, an
//! append-only transaction history with a derived, never-stored
//! balance — the REST surface around it is a thin coordination layer.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── IdentityProvider (identity/)
//!     │
//!     ├── RewardLedger / CollectionService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── Ledger + leaderboard folds (domain/)
//!     └── PostgreSQL Persistence (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod identity;
pub mod persistence;
pub mod service;
