//! Service layer: business orchestration over domain and persistence.

pub mod collection_service;
pub mod ledger_service;

pub use collection_service::CollectionService;
pub use ledger_service::RewardLedger;
