//! Collaborator traits consumed by the settlement orchestrator and the gateway
//!
//! Each store exposes a narrow capability set so that the orchestrator's
//! dependencies are explicit and can be substituted with test doubles.
//! Implementations are handed in as `Arc<dyn Trait>`; nothing reaches for a
//! process-wide handle.

use crate::types::{
    AccountRef, AdminAccountId, AdminWallet, Category, CategoryRequest, ClientId,
    ClientTransaction, ClientWallet, DashboardStats, Decision, EventId, FundReleaseRequest,
    LedgerTransaction, RequestId, RequestStatus, SettlementClaim, StoreError, TransactionId, User,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Durable storage of fund-release requests and their lifecycle status
///
/// The only way to move a request to a terminal status is
/// [`set_status`](FundReleaseRequestStore::set_status) under a claim obtained
/// from [`claim_for_settlement`](FundReleaseRequestStore::claim_for_settlement).
pub trait FundReleaseRequestStore: Send + Sync {
    /// Store a new request (created upstream)
    fn insert(&self, request: FundReleaseRequest) -> Result<(), StoreError>;

    fn get(&self, request_id: RequestId) -> Result<FundReleaseRequest, StoreError>;

    fn list(&self) -> Result<Vec<FundReleaseRequest>, StoreError>;

    /// Atomically verify the request is pending and unclaimed, and claim it
    ///
    /// Exactly one concurrent caller succeeds. Others receive
    /// `AlreadyTerminal` or `SettlementInProgress`.
    fn claim_for_settlement(&self, request_id: RequestId) -> Result<SettlementClaim, StoreError>;

    /// Give a claim back, leaving the request pending and unclaimed
    fn release_claim(&self, request_id: RequestId, claim: &SettlementClaim)
        -> Result<(), StoreError>;

    /// Move a claimed request to a terminal status, consuming the claim
    fn set_status(
        &self,
        request_id: RequestId,
        claim: &SettlementClaim,
        status: RequestStatus,
    ) -> Result<FundReleaseRequest, StoreError>;
}

/// Atomic relative balance updates on admin and client wallets
///
/// There is deliberately no read-modify-write API: every balance change is a
/// relative update applied under the account row's lock. Sufficiency is only
/// checked when the caller passes a floor, and then under the same lock as the
/// update.
pub trait LedgerStore: Send + Sync {
    /// Decrease the balance (and, for the admin wallet, increase withdrawals)
    /// without a sufficiency check
    fn debit(&self, account: &AccountRef, amount: Decimal) -> Result<(), StoreError> {
        self.debit_with_floor(account, amount, None)
    }

    /// Debit that fails with `InsufficientFunds` if the resulting balance
    /// would drop below `floor`
    fn debit_with_floor(
        &self,
        account: &AccountRef,
        amount: Decimal,
        floor: Option<Decimal>,
    ) -> Result<(), StoreError>;

    /// Increase the balance and deposits
    ///
    /// Returns `true` if the credit opened a new client wallet.
    fn credit(&self, account: &AccountRef, amount: Decimal) -> Result<bool, StoreError>;

    /// Exact inverse of a previous [`debit`](LedgerStore::debit)
    fn revert_debit(&self, account: &AccountRef, amount: Decimal) -> Result<(), StoreError>;

    /// Exact inverse of a previous [`credit`](LedgerStore::credit)
    ///
    /// `opened` is the value the credit returned. A wallet the credit opened is
    /// removed again unless other credits have landed on it since.
    fn revert_credit(
        &self,
        account: &AccountRef,
        amount: Decimal,
        opened: bool,
    ) -> Result<(), StoreError>;

    /// Snapshot of the admin wallet
    fn admin_wallet(&self, id: &AdminAccountId) -> Result<AdminWallet, StoreError>;

    /// Snapshot of a client wallet
    fn client_wallet(&self, client_id: ClientId) -> Result<ClientWallet, StoreError>;

    /// Snapshot of every client wallet
    fn client_wallets(&self) -> Result<Vec<ClientWallet>, StoreError>;
}

/// Append-only log of settlement audit records
pub trait TransactionLog: Send + Sync {
    fn append_admin(&self, entry: LedgerTransaction) -> Result<(), StoreError>;

    fn append_client(&self, entry: ClientTransaction) -> Result<(), StoreError>;

    /// Remove an admin entry written by a settlement that never finalized
    fn retract_admin(&self, transaction_id: TransactionId) -> Result<(), StoreError>;

    /// Remove a client entry written by a settlement that never finalized
    fn retract_client(&self, transaction_id: TransactionId) -> Result<(), StoreError>;

    fn admin_entries(&self) -> Result<Vec<LedgerTransaction>, StoreError>;

    fn client_entries(&self) -> Result<Vec<ClientTransaction>, StoreError>;
}

/// Read-only lookup of the client who owns an event
#[async_trait]
pub trait EventOwnerResolver: Send + Sync {
    async fn resolve_owner(&self, event_id: EventId) -> Result<ClientId, StoreError>;
}

/// Set of blocked user identifiers
pub trait BlockedUserSet: Send + Sync {
    /// Returns `true` if the user was not already a member
    fn add(&self, user_id: &str) -> Result<bool, StoreError>;

    /// Returns `true` if the user was a member
    fn remove(&self, user_id: &str) -> Result<bool, StoreError>;

    fn is_member(&self, user_id: &str) -> Result<bool, StoreError>;
}

/// Directory of marketplace users
pub trait UserDirectory: Send + Sync {
    fn list_users(&self) -> Result<Vec<User>, StoreError>;
}

/// Vendor category requests and the category catalogue
pub trait CategoryRequestStore: Send + Sync {
    fn list_requests(&self) -> Result<Vec<CategoryRequest>, StoreError>;

    /// Apply a decision to a pending category request and remove it
    fn resolve_request(
        &self,
        vendor_id: Uuid,
        category_id: Uuid,
        decision: Decision,
    ) -> Result<(), StoreError>;

    fn create_category(&self, name: &str) -> Result<Category, StoreError>;
}

/// Aggregate figures for the admin dashboard
pub trait DashboardSource: Send + Sync {
    fn dashboard_stats(&self) -> Result<DashboardStats, StoreError>;
}
