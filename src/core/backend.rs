//! Collaborator wiring
//!
//! [`Collaborators`] is the bundle of trait objects the orchestrator and the
//! gateway are built from. [`InMemoryBackend`] keeps the concrete in-memory
//! stores alongside so that seeding code and tests can reach inherent methods
//! (`register`, `open_client_wallet`, `is_claimed`, ...) on the same instances.

use super::admin_directory::InMemoryAdminDirectory;
use super::blocked_users::InMemoryBlockedUserSet;
use super::event_directory::InMemoryEventDirectory;
use super::ledger_store::InMemoryLedgerStore;
use super::request_store::InMemoryRequestStore;
use super::traits::{
    BlockedUserSet, CategoryRequestStore, DashboardSource, EventOwnerResolver,
    FundReleaseRequestStore, LedgerStore, TransactionLog, UserDirectory,
};
use super::transaction_log::InMemoryTransactionLog;
use crate::types::AdminWallet;
use std::sync::Arc;

/// Every store and lookup the service depends on
#[derive(Clone)]
pub struct Collaborators {
    pub requests: Arc<dyn FundReleaseRequestStore>,
    pub ledger: Arc<dyn LedgerStore>,
    pub log: Arc<dyn TransactionLog>,
    pub resolver: Arc<dyn EventOwnerResolver>,
    pub blocked_users: Arc<dyn BlockedUserSet>,
    pub users: Arc<dyn UserDirectory>,
    pub categories: Arc<dyn CategoryRequestStore>,
    pub dashboard: Arc<dyn DashboardSource>,
}

/// In-process implementation of every collaborator
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    pub requests: Arc<InMemoryRequestStore>,
    pub ledger: Arc<InMemoryLedgerStore>,
    pub log: Arc<InMemoryTransactionLog>,
    pub events: Arc<InMemoryEventDirectory>,
    pub blocked_users: Arc<InMemoryBlockedUserSet>,
    pub directory: Arc<InMemoryAdminDirectory>,
}

impl InMemoryBackend {
    /// Create empty stores around the given admin wallet
    pub fn new(admin_wallet: AdminWallet) -> Self {
        Self {
            requests: Arc::new(InMemoryRequestStore::new()),
            ledger: Arc::new(InMemoryLedgerStore::new(admin_wallet)),
            log: Arc::new(InMemoryTransactionLog::new()),
            events: Arc::new(InMemoryEventDirectory::new()),
            blocked_users: Arc::new(InMemoryBlockedUserSet::new()),
            directory: Arc::new(InMemoryAdminDirectory::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            requests: self.requests.clone(),
            ledger: self.ledger.clone(),
            log: self.log.clone(),
            resolver: self.events.clone(),
            blocked_users: self.blocked_users.clone(),
            users: self.directory.clone(),
            categories: self.directory.clone(),
            dashboard: self.directory.clone(),
        }
    }
}
