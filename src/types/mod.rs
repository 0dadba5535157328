//! Types module
//!
//! Contains core data structures used throughout the service.
//! This module organizes types into logical submodules:
//! - `request`: Fund-release requests, decisions and settlement claims
//! - `wallet`: Admin and client wallets
//! - `ledger`: Settlement audit records
//! - `admin`: Users, category requests and dashboard figures
//! - `error`: Error taxonomy

pub mod admin;
pub mod error;
pub mod ledger;
pub mod request;
pub mod wallet;

pub use admin::{Booking, Category, CategoryRequest, DashboardStats, Role, User, UserId};
pub use error::{
    CompensationFailure, ConfigError, ConflictReason, ErrorKind, RollbackOutcome,
    SettlementError, SettlementStep, StoreError,
};
pub use ledger::{ClientTransaction, LedgerTransaction, TransactionId};
pub use request::{
    ClaimToken, Decision, EventId, FundReleaseRequest, RequestId, RequestStatus, SettlementClaim,
};
pub use wallet::{AccountRef, AdminAccountId, AdminWallet, ClientId, ClientWallet};
