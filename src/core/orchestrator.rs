//! Settlement orchestrator
//!
//! This module provides the `SettlementOrchestrator`, which applies an admin's
//! decision to a pending fund-release request. Rejection only changes the
//! request status. Approval moves `amount` from the admin wallet to the event
//! organizer's wallet and writes one audit record on each side.
//!
//! # Steps
//!
//! ```text
//! claim ──> resolve owner ──> debit admin ──> credit client
//!       ──> append ledger entry ──> append client entry ──> finalize
//! ```
//!
//! The claim is an atomic compare-and-set on the request row, so exactly one
//! concurrent caller proceeds. Everything after the claim runs inside a
//! [`SettlementSaga`]; if a step fails, the completed steps are compensated in
//! reverse order and the request is left pending.
//!
//! Under [`OverdraftPolicy::Reject`] the admin debit carries a zero floor, so
//! the sufficiency check happens inside the ledger's atomic update and two
//! concurrent approvals cannot both spend the same balance.
//!
//! Only the owner lookup awaits. The deadline is enforced around it, and once
//! the debit starts the remaining steps run without yielding, so a cancelled
//! caller can interrupt a settlement only before any wallet is touched.

use super::saga::{Compensation, SettlementSaga};
use super::traits::{EventOwnerResolver, FundReleaseRequestStore, LedgerStore, TransactionLog};
use super::Collaborators;
use crate::config::OverdraftPolicy;
use crate::types::{
    AccountRef, AdminAccountId, ClientId, ClientTransaction, Decision, FundReleaseRequest,
    LedgerTransaction, RequestId, RequestStatus, RollbackOutcome, SettlementError, SettlementStep,
    StoreError, TransactionId,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Money movement performed by an approval
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub client_id: ClientId,
    pub amount: Decimal,
    pub ledger_transaction_id: TransactionId,
    pub client_transaction_id: TransactionId,
}

/// Result of a successful settlement
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementReceipt {
    /// The request in its final status
    pub request: FundReleaseRequest,
    /// Present only for approvals
    pub transfer: Option<Transfer>,
}

/// Applies approve/reject decisions to fund-release requests
pub struct SettlementOrchestrator {
    requests: Arc<dyn FundReleaseRequestStore>,
    ledger: Arc<dyn LedgerStore>,
    log: Arc<dyn TransactionLog>,
    resolver: Arc<dyn EventOwnerResolver>,
    admin: AdminAccountId,
    overdraft: OverdraftPolicy,
}

impl SettlementOrchestrator {
    /// Create an orchestrator over the given collaborators
    ///
    /// Uses the default admin account and [`OverdraftPolicy::Reject`].
    pub fn new(collaborators: &Collaborators) -> Self {
        SettlementOrchestrator {
            requests: Arc::clone(&collaborators.requests),
            ledger: Arc::clone(&collaborators.ledger),
            log: Arc::clone(&collaborators.log),
            resolver: Arc::clone(&collaborators.resolver),
            admin: AdminAccountId::default(),
            overdraft: OverdraftPolicy::default(),
        }
    }

    pub fn with_admin_account(mut self, admin: AdminAccountId) -> Self {
        self.admin = admin;
        self
    }

    pub fn with_overdraft_policy(mut self, overdraft: OverdraftPolicy) -> Self {
        self.overdraft = overdraft;
        self
    }

    pub fn admin_account(&self) -> &AdminAccountId {
        &self.admin
    }

    /// Apply `decision` to a pending request
    ///
    /// # Arguments
    ///
    /// * `request_id` - The fund-release request to settle
    /// * `decision` - Approve (transfer funds) or reject (status only)
    /// * `deadline` - Optional instant after which the settlement is abandoned,
    ///   honoured up to the point where the first wallet is touched
    ///
    /// # Returns
    ///
    /// * `Ok(SettlementReceipt)` with the request in its terminal status
    /// * `Err(SettlementError)` if the settlement had no effect
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request, event or owner does not exist
    /// - `Conflict` if the request is terminal or already being settled
    /// - `FailedPrecondition` if the overdraft policy refuses the debit
    /// - `DeadlineExceeded` if the deadline passed before the debit
    /// - `Internal` if a store failed; the error carries the rollback outcome
    pub async fn settle(
        &self,
        request_id: RequestId,
        decision: Decision,
        deadline: Option<Instant>,
    ) -> Result<SettlementReceipt, SettlementError> {
        check_deadline(request_id, deadline, SettlementStep::Claim)?;

        let claim = self
            .requests
            .claim_for_settlement(request_id)
            .map_err(|e| {
                let err = SettlementError::from_claim(request_id, e);
                warn!(request_id = %request_id, decision = %decision, error = %err, "Settlement refused");
                err
            })?;

        let saga = SettlementSaga::begin(
            claim,
            self.requests.as_ref(),
            self.ledger.as_ref(),
            self.log.as_ref(),
        );

        match decision {
            Decision::Rejected => self.reject(saga),
            Decision::Approved => self.approve(saga, deadline).await,
        }
    }

    fn reject(&self, saga: SettlementSaga<'_>) -> Result<SettlementReceipt, SettlementError> {
        let request_id = saga.request_id();
        match self
            .requests
            .set_status(request_id, saga.claim(), RequestStatus::Rejected)
        {
            Ok(request) => {
                saga.commit();
                info!(
                    request_id = %request_id,
                    decision = %Decision::Rejected,
                    "Fund release request rejected"
                );
                Ok(SettlementReceipt {
                    request,
                    transfer: None,
                })
            }
            Err(source) => Err(self.fail(saga, SettlementStep::Finalize, source)),
        }
    }

    async fn approve(
        &self,
        mut saga: SettlementSaga<'_>,
        deadline: Option<Instant>,
    ) -> Result<SettlementReceipt, SettlementError> {
        let request = saga.claim().request().clone();
        let request_id = request.request_id;

        let client_id = match self.resolve_beneficiary(&request, deadline).await {
            Ok(client_id) => client_id,
            Err(err) => return Err(abandon(saga, err)),
        };

        if let Err(err) = check_deadline(request_id, deadline, SettlementStep::ResolveOwner) {
            return Err(abandon(saga, err));
        }

        // No await point from here on
        match self.transfer(&mut saga, &request, client_id) {
            Ok((updated, transfer)) => {
                saga.commit();
                info!(
                    request_id = %request_id,
                    decision = %Decision::Approved,
                    amount = %transfer.amount,
                    client_id = %transfer.client_id,
                    "Fund release request approved"
                );
                Ok(SettlementReceipt {
                    request: updated,
                    transfer: Some(transfer),
                })
            }
            Err((
                SettlementStep::DebitAdmin,
                StoreError::InsufficientFunds {
                    available,
                    requested,
                    ..
                },
            )) => Err(abandon(
                saga,
                SettlementError::InsufficientFunds {
                    available,
                    requested,
                },
            )),
            Err((step, source)) => Err(self.fail(saga, step, source)),
        }
    }

    async fn resolve_beneficiary(
        &self,
        request: &FundReleaseRequest,
        deadline: Option<Instant>,
    ) -> Result<ClientId, SettlementError> {
        let request_id = request.request_id;
        let lookup = self.resolver.resolve_owner(request.event_id);

        let resolved = match deadline {
            Some(at) => tokio::time::timeout_at(at, lookup).await.map_err(|_| {
                SettlementError::DeadlineExceeded {
                    request: request_id,
                    step: SettlementStep::ResolveOwner,
                }
            })?,
            None => lookup.await,
        };

        resolved.map_err(|e| match e {
            StoreError::NotFound { entity, id } => SettlementError::NotFound { entity, id },
            source => SettlementError::Internal {
                request: request_id,
                step: SettlementStep::ResolveOwner,
                source,
                outcome: RollbackOutcome::NothingCommitted,
            },
        })
    }

    /// Debit, credit, write the audit pair and finalize, recording each
    /// completed step in the saga
    fn transfer(
        &self,
        saga: &mut SettlementSaga<'_>,
        request: &FundReleaseRequest,
        client_id: ClientId,
    ) -> Result<(FundReleaseRequest, Transfer), (SettlementStep, StoreError)> {
        let request_id = request.request_id;
        let amount = request.amount;
        let admin = AccountRef::Admin(self.admin.clone());
        let client = AccountRef::Client(client_id);

        let now = Utc::now();
        let ledger_entry = LedgerTransaction::fund_release(request_id, amount, now);
        let client_entry = ClientTransaction::fund_release(request_id, client_id, amount, now);
        let transfer = Transfer {
            client_id,
            amount,
            ledger_transaction_id: ledger_entry.transaction_id,
            client_transaction_id: client_entry.transaction_id,
        };

        saga.run(
            SettlementStep::DebitAdmin,
            Compensation::RevertDebit {
                account: admin.clone(),
                amount,
            },
            || {
                self.ledger
                    .debit_with_floor(&admin, amount, self.overdraft.floor())
            },
        )
        .map_err(|e| (SettlementStep::DebitAdmin, e))?;

        saga.run_with(
            SettlementStep::CreditClient,
            || self.ledger.credit(&client, amount),
            |opened| Compensation::RevertCredit {
                account: client.clone(),
                amount,
                opened: *opened,
            },
        )
        .map_err(|e| (SettlementStep::CreditClient, e))?;

        saga.run(
            SettlementStep::AppendLedgerEntry,
            Compensation::RetractLedgerEntry(transfer.ledger_transaction_id),
            || self.log.append_admin(ledger_entry),
        )
        .map_err(|e| (SettlementStep::AppendLedgerEntry, e))?;

        saga.run(
            SettlementStep::AppendClientEntry,
            Compensation::RetractClientEntry(transfer.client_transaction_id),
            || self.log.append_client(client_entry),
        )
        .map_err(|e| (SettlementStep::AppendClientEntry, e))?;

        let updated = self
            .requests
            .set_status(request_id, saga.claim(), RequestStatus::Approved)
            .map_err(|e| (SettlementStep::Finalize, e))?;

        Ok((updated, transfer))
    }

    /// Roll back after a store failure and build the `Internal` error
    fn fail(
        &self,
        saga: SettlementSaga<'_>,
        step: SettlementStep,
        source: StoreError,
    ) -> SettlementError {
        let request_id = saga.request_id();
        let outcome = saga.rollback();

        if outcome.needs_reconciliation() {
            error!(
                request_id = %request_id,
                step = %step,
                error = %source,
                outcome = %outcome,
                admin = %self.admin,
                "Settlement rollback failed, manual reconciliation required"
            );
        } else {
            error!(
                request_id = %request_id,
                step = %step,
                error = %source,
                outcome = %outcome,
                "Settlement failed and was rolled back"
            );
        }

        SettlementError::Internal {
            request: request_id,
            step,
            source,
            outcome,
        }
    }
}

/// Release the claim after a failure that happened before any effect
fn abandon(saga: SettlementSaga<'_>, err: SettlementError) -> SettlementError {
    let request_id = saga.request_id();
    let outcome = saga.rollback();
    if outcome.needs_reconciliation() {
        error!(
            request_id = %request_id,
            error = %err,
            outcome = %outcome,
            "Claim could not be released, request stays locked"
        );
    } else {
        warn!(request_id = %request_id, error = %err, "Settlement abandoned before any transfer");
    }
    err
}

fn check_deadline(
    request_id: RequestId,
    deadline: Option<Instant>,
    step: SettlementStep,
) -> Result<(), SettlementError> {
    match deadline {
        Some(at) if Instant::now() >= at => Err(SettlementError::DeadlineExceeded {
            request: request_id,
            step,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::faults::{FaultyLedger, LedgerOp, SlowResolver};
    use crate::core::InMemoryBackend;
    use crate::types::{AdminWallet, ConflictReason, ErrorKind};
    use std::time::Duration;
    use uuid::Uuid;

    struct Harness {
        backend: InMemoryBackend,
        request_id: RequestId,
        client_id: ClientId,
    }

    fn harness(admin_balance: Decimal, amount: Decimal) -> Harness {
        let backend = InMemoryBackend::new(AdminWallet::with_totals(
            AdminAccountId::default(),
            admin_balance,
            Decimal::ZERO,
        ));
        let request_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let client_id = Uuid::new_v4();
        backend
            .requests
            .insert(FundReleaseRequest::new(request_id, event_id, "Summer Fair", amount, 50).unwrap())
            .unwrap();
        backend.events.register(event_id, client_id);
        Harness {
            backend,
            request_id,
            client_id,
        }
    }

    fn orchestrator(h: &Harness) -> SettlementOrchestrator {
        SettlementOrchestrator::new(&h.backend.collaborators())
    }

    #[tokio::test]
    async fn test_approve_moves_funds_and_writes_audit_pair() {
        let h = harness(Decimal::new(100000, 2), Decimal::new(50000, 2));

        let receipt = orchestrator(&h)
            .settle(h.request_id, Decision::Approved, None)
            .await
            .unwrap();

        assert_eq!(receipt.request.status, RequestStatus::Approved);
        let transfer = receipt.transfer.unwrap();
        assert_eq!(transfer.client_id, h.client_id);
        assert_eq!(transfer.amount, Decimal::new(50000, 2));

        let admin = h.backend.ledger.admin_wallet(&AdminAccountId::default()).unwrap();
        assert_eq!(admin.balance, Decimal::new(50000, 2));
        assert_eq!(admin.total_withdrawals, Decimal::new(50000, 2));
        let client = h.backend.ledger.client_wallet(h.client_id).unwrap();
        assert_eq!(client.balance, Decimal::new(50000, 2));
        assert_eq!(client.total_deposits, Decimal::new(50000, 2));

        assert_eq!(h.backend.log.admin_entries().unwrap().len(), 1);
        assert_eq!(h.backend.log.client_entries().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_approval_conflicts() {
        let h = harness(Decimal::new(100000, 2), Decimal::new(50000, 2));
        let orchestrator = orchestrator(&h);

        orchestrator
            .settle(h.request_id, Decision::Approved, None)
            .await
            .unwrap();
        let err = orchestrator
            .settle(h.request_id, Decision::Approved, None)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SettlementError::Conflict {
                request: h.request_id,
                reason: ConflictReason::AlreadyTerminal(RequestStatus::Approved),
            }
        );
        let admin = h.backend.ledger.admin_wallet(&AdminAccountId::default()).unwrap();
        assert_eq!(admin.total_withdrawals, Decimal::new(50000, 2));
        assert_eq!(h.backend.log.admin_entries().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reject_touches_no_wallet() {
        let h = harness(Decimal::new(100000, 2), Decimal::new(50000, 2));

        let receipt = orchestrator(&h)
            .settle(h.request_id, Decision::Rejected, None)
            .await
            .unwrap();

        assert_eq!(receipt.request.status, RequestStatus::Rejected);
        assert!(receipt.transfer.is_none());
        let admin = h.backend.ledger.admin_wallet(&AdminAccountId::default()).unwrap();
        assert_eq!(admin.balance, Decimal::new(100000, 2));
        assert!(h.backend.ledger.client_wallets().unwrap().is_empty());
        assert!(h.backend.log.admin_entries().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_event_is_not_found_and_request_stays_pending() {
        let h = harness(Decimal::new(100000, 2), Decimal::new(50000, 2));
        let orphan = Uuid::new_v4();
        h.backend
            .requests
            .insert(FundReleaseRequest::new(orphan, Uuid::new_v4(), "Orphan", Decimal::ONE, 1).unwrap())
            .unwrap();

        let err = orchestrator(&h)
            .settle(orphan, Decision::Approved, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(h.backend.requests.get(orphan).unwrap().status, RequestStatus::Pending);
        assert!(!h.backend.requests.is_claimed(orphan));
        let admin = h.backend.ledger.admin_wallet(&AdminAccountId::default()).unwrap();
        assert_eq!(admin.balance, Decimal::new(100000, 2));
    }

    #[tokio::test]
    async fn test_unknown_request_is_not_found() {
        let h = harness(Decimal::new(100000, 2), Decimal::new(50000, 2));
        let err = orchestrator(&h)
            .settle(Uuid::new_v4(), Decision::Approved, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_overdraft_rejected_by_default() {
        let h = harness(Decimal::new(10000, 2), Decimal::new(50000, 2));

        let err = orchestrator(&h)
            .settle(h.request_id, Decision::Approved, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
        assert!(!h.backend.requests.is_claimed(h.request_id));
        let admin = h.backend.ledger.admin_wallet(&AdminAccountId::default()).unwrap();
        assert_eq!(admin.balance, Decimal::new(10000, 2));
    }

    #[tokio::test]
    async fn test_overdraft_allowed_goes_negative() {
        let h = harness(Decimal::new(10000, 2), Decimal::new(50000, 2));

        orchestrator(&h)
            .with_overdraft_policy(OverdraftPolicy::Allow)
            .settle(h.request_id, Decision::Approved, None)
            .await
            .unwrap();

        let admin = h.backend.ledger.admin_wallet(&AdminAccountId::default()).unwrap();
        assert_eq!(admin.balance, Decimal::new(-40000, 2));
        assert!(admin.is_balanced());
    }

    #[tokio::test]
    async fn test_credit_failure_rolls_back_debit() {
        let h = harness(Decimal::new(100000, 2), Decimal::new(50000, 2));
        let collaborators = Collaborators {
            ledger: Arc::new(
                FaultyLedger::new(h.backend.ledger.clone()).fail_always(LedgerOp::Credit),
            ),
            ..h.backend.collaborators()
        };

        let err = SettlementOrchestrator::new(&collaborators)
            .settle(h.request_id, Decision::Approved, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(
            err.outcome(),
            Some(&RollbackOutcome::RolledBack {
                compensated: vec![SettlementStep::DebitAdmin]
            })
        );
        let admin = h.backend.ledger.admin_wallet(&AdminAccountId::default()).unwrap();
        assert_eq!(admin.balance, Decimal::new(100000, 2));
        assert_eq!(admin.total_withdrawals, Decimal::ZERO);
        assert_eq!(h.backend.requests.get(h.request_id).unwrap().status, RequestStatus::Pending);
        assert!(!h.backend.requests.is_claimed(h.request_id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_during_lookup_releases_claim() {
        let h = harness(Decimal::new(100000, 2), Decimal::new(50000, 2));
        let collaborators = Collaborators {
            resolver: Arc::new(SlowResolver::new(
                h.backend.events.clone(),
                Duration::from_secs(5),
            )),
            ..h.backend.collaborators()
        };
        let deadline = Instant::now() + Duration::from_secs(1);

        let err = SettlementOrchestrator::new(&collaborators)
            .settle(h.request_id, Decision::Approved, Some(deadline))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SettlementError::DeadlineExceeded {
                request: h.request_id,
                step: SettlementStep::ResolveOwner,
            }
        );
        assert!(!h.backend.requests.is_claimed(h.request_id));
        let admin = h.backend.ledger.admin_wallet(&AdminAccountId::default()).unwrap();
        assert_eq!(admin.balance, Decimal::new(100000, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_never_claims() {
        let h = harness(Decimal::new(100000, 2), Decimal::new(50000, 2));
        let deadline = Instant::now();
        tokio::time::advance(Duration::from_millis(10)).await;

        let err = orchestrator(&h)
            .settle(h.request_id, Decision::Rejected, Some(deadline))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
        assert_eq!(h.backend.requests.get(h.request_id).unwrap().status, RequestStatus::Pending);
    }
}
