//! Fault-injecting collaborator wrappers
//!
//! Each wrapper delegates to an inner store and fails selected operations
//! with [`StoreError::Unavailable`], either on every call or on the n-th call
//! only. Used to exercise rollback paths in tests and benchmarks.

use super::traits::{EventOwnerResolver, FundReleaseRequestStore, LedgerStore, TransactionLog};
use crate::types::{
    AccountRef, AdminAccountId, AdminWallet, ClientId, ClientTransaction, ClientWallet, EventId,
    FundReleaseRequest, LedgerTransaction, RequestId, RequestStatus, SettlementClaim, StoreError,
    TransactionId,
};
use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerOp {
    Debit,
    Credit,
    RevertDebit,
    RevertCredit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogOp {
    AppendAdmin,
    AppendClient,
    RetractAdmin,
    RetractClient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestOp {
    Claim,
    Release,
    SetStatus,
}

#[derive(Debug, Clone, Copy)]
enum FaultRule {
    Always,
    /// Fail only the n-th call (1-based)
    OnCall(usize),
}

/// Per-operation call counters and failure rules
#[derive(Debug)]
struct FaultSet<Op: Eq + Hash> {
    rules: DashMap<Op, FaultRule>,
    calls: DashMap<Op, usize>,
}

impl<Op: Copy + Debug + Eq + Hash> FaultSet<Op> {
    fn new() -> Self {
        FaultSet {
            rules: DashMap::new(),
            calls: DashMap::new(),
        }
    }

    fn set(&self, op: Op, rule: FaultRule) {
        self.rules.insert(op, rule);
    }

    /// Count the call and fail it if a rule matches
    fn check(&self, op: Op) -> Result<(), StoreError> {
        let call = {
            let mut count = self.calls.entry(op).or_insert(0);
            *count += 1;
            *count
        };
        let tripped = match self.rules.get(&op).map(|rule| *rule.value()) {
            Some(FaultRule::Always) => true,
            Some(FaultRule::OnCall(n)) => n == call,
            None => false,
        };
        if tripped {
            Err(StoreError::unavailable(format!("injected failure in {:?}", op)))
        } else {
            Ok(())
        }
    }

    fn calls(&self, op: Op) -> usize {
        self.calls.get(&op).map(|count| *count.value()).unwrap_or(0)
    }
}

/// [`LedgerStore`] wrapper that fails selected operations
pub struct FaultyLedger {
    inner: Arc<dyn LedgerStore>,
    faults: FaultSet<LedgerOp>,
}

impl FaultyLedger {
    pub fn new(inner: Arc<dyn LedgerStore>) -> Self {
        FaultyLedger {
            inner,
            faults: FaultSet::new(),
        }
    }

    pub fn fail_always(self, op: LedgerOp) -> Self {
        self.faults.set(op, FaultRule::Always);
        self
    }

    pub fn fail_on_call(self, op: LedgerOp, call: usize) -> Self {
        self.faults.set(op, FaultRule::OnCall(call));
        self
    }

    pub fn calls(&self, op: LedgerOp) -> usize {
        self.faults.calls(op)
    }
}

impl LedgerStore for FaultyLedger {
    fn debit_with_floor(
        &self,
        account: &AccountRef,
        amount: Decimal,
        floor: Option<Decimal>,
    ) -> Result<(), StoreError> {
        self.faults.check(LedgerOp::Debit)?;
        self.inner.debit_with_floor(account, amount, floor)
    }

    fn credit(&self, account: &AccountRef, amount: Decimal) -> Result<bool, StoreError> {
        self.faults.check(LedgerOp::Credit)?;
        self.inner.credit(account, amount)
    }

    fn revert_debit(&self, account: &AccountRef, amount: Decimal) -> Result<(), StoreError> {
        self.faults.check(LedgerOp::RevertDebit)?;
        self.inner.revert_debit(account, amount)
    }

    fn revert_credit(
        &self,
        account: &AccountRef,
        amount: Decimal,
        opened: bool,
    ) -> Result<(), StoreError> {
        self.faults.check(LedgerOp::RevertCredit)?;
        self.inner.revert_credit(account, amount, opened)
    }

    fn admin_wallet(&self, id: &AdminAccountId) -> Result<AdminWallet, StoreError> {
        self.inner.admin_wallet(id)
    }

    fn client_wallet(&self, client_id: ClientId) -> Result<ClientWallet, StoreError> {
        self.inner.client_wallet(client_id)
    }

    fn client_wallets(&self) -> Result<Vec<ClientWallet>, StoreError> {
        self.inner.client_wallets()
    }
}

/// [`TransactionLog`] wrapper that fails selected operations
pub struct FaultyTransactionLog {
    inner: Arc<dyn TransactionLog>,
    faults: FaultSet<LogOp>,
}

impl FaultyTransactionLog {
    pub fn new(inner: Arc<dyn TransactionLog>) -> Self {
        FaultyTransactionLog {
            inner,
            faults: FaultSet::new(),
        }
    }

    pub fn fail_always(self, op: LogOp) -> Self {
        self.faults.set(op, FaultRule::Always);
        self
    }

    pub fn fail_on_call(self, op: LogOp, call: usize) -> Self {
        self.faults.set(op, FaultRule::OnCall(call));
        self
    }

    pub fn calls(&self, op: LogOp) -> usize {
        self.faults.calls(op)
    }
}

impl TransactionLog for FaultyTransactionLog {
    fn append_admin(&self, entry: LedgerTransaction) -> Result<(), StoreError> {
        self.faults.check(LogOp::AppendAdmin)?;
        self.inner.append_admin(entry)
    }

    fn append_client(&self, entry: ClientTransaction) -> Result<(), StoreError> {
        self.faults.check(LogOp::AppendClient)?;
        self.inner.append_client(entry)
    }

    fn retract_admin(&self, transaction_id: TransactionId) -> Result<(), StoreError> {
        self.faults.check(LogOp::RetractAdmin)?;
        self.inner.retract_admin(transaction_id)
    }

    fn retract_client(&self, transaction_id: TransactionId) -> Result<(), StoreError> {
        self.faults.check(LogOp::RetractClient)?;
        self.inner.retract_client(transaction_id)
    }

    fn admin_entries(&self) -> Result<Vec<LedgerTransaction>, StoreError> {
        self.inner.admin_entries()
    }

    fn client_entries(&self) -> Result<Vec<ClientTransaction>, StoreError> {
        self.inner.client_entries()
    }
}

/// [`FundReleaseRequestStore`] wrapper that fails selected operations
pub struct FaultyRequestStore {
    inner: Arc<dyn FundReleaseRequestStore>,
    faults: FaultSet<RequestOp>,
}

impl FaultyRequestStore {
    pub fn new(inner: Arc<dyn FundReleaseRequestStore>) -> Self {
        FaultyRequestStore {
            inner,
            faults: FaultSet::new(),
        }
    }

    pub fn fail_always(self, op: RequestOp) -> Self {
        self.faults.set(op, FaultRule::Always);
        self
    }

    pub fn fail_on_call(self, op: RequestOp, call: usize) -> Self {
        self.faults.set(op, FaultRule::OnCall(call));
        self
    }

    pub fn calls(&self, op: RequestOp) -> usize {
        self.faults.calls(op)
    }
}

impl FundReleaseRequestStore for FaultyRequestStore {
    fn insert(&self, request: FundReleaseRequest) -> Result<(), StoreError> {
        self.inner.insert(request)
    }

    fn get(&self, request_id: RequestId) -> Result<FundReleaseRequest, StoreError> {
        self.inner.get(request_id)
    }

    fn list(&self) -> Result<Vec<FundReleaseRequest>, StoreError> {
        self.inner.list()
    }

    fn claim_for_settlement(&self, request_id: RequestId) -> Result<SettlementClaim, StoreError> {
        self.faults.check(RequestOp::Claim)?;
        self.inner.claim_for_settlement(request_id)
    }

    fn release_claim(
        &self,
        request_id: RequestId,
        claim: &SettlementClaim,
    ) -> Result<(), StoreError> {
        self.faults.check(RequestOp::Release)?;
        self.inner.release_claim(request_id, claim)
    }

    fn set_status(
        &self,
        request_id: RequestId,
        claim: &SettlementClaim,
        status: RequestStatus,
    ) -> Result<FundReleaseRequest, StoreError> {
        self.faults.check(RequestOp::SetStatus)?;
        self.inner.set_status(request_id, claim, status)
    }
}

/// Resolver whose backend is always down
#[derive(Debug, Default)]
pub struct UnavailableResolver;

#[async_trait]
impl EventOwnerResolver for UnavailableResolver {
    async fn resolve_owner(&self, event_id: EventId) -> Result<ClientId, StoreError> {
        Err(StoreError::unavailable(format!(
            "event directory unreachable while resolving {}",
            event_id
        )))
    }
}

/// Resolver that sleeps before delegating
pub struct SlowResolver {
    inner: Arc<dyn EventOwnerResolver>,
    delay: Duration,
}

impl SlowResolver {
    pub fn new(inner: Arc<dyn EventOwnerResolver>, delay: Duration) -> Self {
        SlowResolver { inner, delay }
    }
}

#[async_trait]
impl EventOwnerResolver for SlowResolver {
    async fn resolve_owner(&self, event_id: EventId) -> Result<ClientId, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.resolve_owner(event_id).await
    }
}
