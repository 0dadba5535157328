//! Core business logic module
//!
//! This module contains the settlement components:
//! - `traits` - Collaborator abstractions handed in as `Arc<dyn Trait>`
//! - `orchestrator` - Applies approve/reject decisions to fund-release requests
//! - `saga` - Step log with compensating actions for one settlement
//! - `request_store`, `ledger_store`, `transaction_log` - In-memory stores
//! - `event_directory`, `blocked_users`, `admin_directory` - In-memory lookups
//! - `backend` - Wiring of the in-memory collaborators
//! - `faults` - Fault-injecting wrappers for exercising rollback paths

pub mod admin_directory;
pub mod backend;
pub mod blocked_users;
pub mod event_directory;
pub mod faults;
pub mod ledger_store;
pub mod orchestrator;
pub mod request_store;
pub mod saga;
pub mod traits;
pub mod transaction_log;

pub use admin_directory::InMemoryAdminDirectory;
pub use backend::{Collaborators, InMemoryBackend};
pub use blocked_users::InMemoryBlockedUserSet;
pub use event_directory::InMemoryEventDirectory;
pub use ledger_store::InMemoryLedgerStore;
pub use orchestrator::{SettlementOrchestrator, SettlementReceipt, Transfer};
pub use request_store::InMemoryRequestStore;
pub use saga::{Compensation, SettlementSaga};
pub use traits::{
    BlockedUserSet, CategoryRequestStore, DashboardSource, EventOwnerResolver,
    FundReleaseRequestStore, LedgerStore, TransactionLog, UserDirectory,
};
pub use transaction_log::InMemoryTransactionLog;
