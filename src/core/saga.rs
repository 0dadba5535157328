//! Compensating-action wrapper for one settlement
//!
//! The request store, the ledger and the audit log are independent stores with
//! no shared transaction. `SettlementSaga` gives a settlement all-or-nothing
//! visibility by recording every completed step together with the action that
//! undoes it, and replaying those actions in reverse order if the settlement
//! fails.
//!
//! # Lifecycle
//!
//! ```text
//! begin(claim) ──> run(step)* ──┬──> commit()      effects kept, claim consumed
//!                               └──> rollback()    effects undone, claim released
//! ```
//!
//! A saga dropped while still open (for example because the caller's future
//! was cancelled while the beneficiary lookup was pending) rolls itself back.
//!
//! If any compensation fails, the claim is kept so that no retry can settle
//! the request again, and the outcome is flagged for manual reconciliation.

use super::traits::{FundReleaseRequestStore, LedgerStore, TransactionLog};
use crate::types::{
    AccountRef, CompensationFailure, RequestId, RollbackOutcome, SettlementClaim, SettlementStep,
    StoreError, TransactionId,
};
use rust_decimal::Decimal;
use tracing::{error, warn};

/// Action that undoes one completed settlement step
#[derive(Debug, Clone, PartialEq)]
pub enum Compensation {
    ReleaseClaim,
    RevertDebit { account: AccountRef, amount: Decimal },
    /// `opened` is set when the credit created the wallet
    RevertCredit {
        account: AccountRef,
        amount: Decimal,
        opened: bool,
    },
    RetractLedgerEntry(TransactionId),
    RetractClientEntry(TransactionId),
}

/// In-flight settlement with its undo log
pub struct SettlementSaga<'a> {
    claim: SettlementClaim,
    requests: &'a dyn FundReleaseRequestStore,
    ledger: &'a dyn LedgerStore,
    log: &'a dyn TransactionLog,
    completed: Vec<(SettlementStep, Compensation)>,
    open: bool,
}

impl<'a> SettlementSaga<'a> {
    /// Start a saga for a request whose claim has just been won
    pub fn begin(
        claim: SettlementClaim,
        requests: &'a dyn FundReleaseRequestStore,
        ledger: &'a dyn LedgerStore,
        log: &'a dyn TransactionLog,
    ) -> Self {
        SettlementSaga {
            claim,
            requests,
            ledger,
            log,
            completed: vec![(SettlementStep::Claim, Compensation::ReleaseClaim)],
            open: true,
        }
    }

    pub fn claim(&self) -> &SettlementClaim {
        &self.claim
    }

    pub fn request_id(&self) -> RequestId {
        self.claim.request_id()
    }

    /// Steps completed so far, in execution order
    pub fn completed_steps(&self) -> Vec<SettlementStep> {
        self.completed.iter().map(|(step, _)| *step).collect()
    }

    /// Run one forward step and, if it succeeds, remember how to undo it
    ///
    /// A failed action is assumed to have had no effect, so nothing is
    /// recorded for it.
    pub fn run<T, F>(
        &mut self,
        step: SettlementStep,
        compensation: Compensation,
        action: F,
    ) -> Result<T, StoreError>
    where
        F: FnOnce() -> Result<T, StoreError>,
    {
        self.run_with(step, action, |_| compensation)
    }

    /// Like [`run`](Self::run), for steps whose undo depends on what the
    /// action reported
    pub fn run_with<T, F, C>(
        &mut self,
        step: SettlementStep,
        action: F,
        compensation: C,
    ) -> Result<T, StoreError>
    where
        F: FnOnce() -> Result<T, StoreError>,
        C: FnOnce(&T) -> Compensation,
    {
        let value = action()?;
        self.completed.push((step, compensation(&value)));
        Ok(value)
    }

    /// Keep every effect; the claim has been consumed by the final transition
    pub fn commit(mut self) {
        self.open = false;
        self.completed.clear();
    }

    /// Undo every completed step in reverse order
    pub fn rollback(mut self) -> RollbackOutcome {
        self.unwind()
    }

    fn unwind(&mut self) -> RollbackOutcome {
        self.open = false;
        let request_id = self.request_id();
        let completed = std::mem::take(&mut self.completed);

        let mut compensated = Vec::new();
        let mut failed: Vec<CompensationFailure> = Vec::new();

        for (step, compensation) in completed.into_iter().rev() {
            if compensation == Compensation::ReleaseClaim && !failed.is_empty() {
                // Keep the claim so retries see a conflict instead of re-applying effects
                warn!(
                    request_id = %request_id,
                    "Leaving fund release request claimed pending reconciliation"
                );
                continue;
            }

            match self.compensate(&compensation) {
                Ok(()) => {
                    if step != SettlementStep::Claim {
                        compensated.push(step);
                    }
                }
                Err(err) => {
                    error!(
                        request_id = %request_id,
                        step = %step,
                        error = %err,
                        "Compensation failed"
                    );
                    failed.push(CompensationFailure { step, error: err });
                }
            }
        }

        if !failed.is_empty() {
            RollbackOutcome::ReconciliationRequired { failed }
        } else if compensated.is_empty() {
            RollbackOutcome::NothingCommitted
        } else {
            RollbackOutcome::RolledBack { compensated }
        }
    }

    fn compensate(&self, compensation: &Compensation) -> Result<(), StoreError> {
        match compensation {
            Compensation::ReleaseClaim => self
                .requests
                .release_claim(self.claim.request_id(), &self.claim),
            Compensation::RevertDebit { account, amount } => {
                self.ledger.revert_debit(account, *amount)
            }
            Compensation::RevertCredit {
                account,
                amount,
                opened,
            } => self.ledger.revert_credit(account, *amount, *opened),
            Compensation::RetractLedgerEntry(id) => self.log.retract_admin(*id),
            Compensation::RetractClientEntry(id) => self.log.retract_client(*id),
        }
    }
}

impl Drop for SettlementSaga<'_> {
    fn drop(&mut self) {
        if self.open {
            warn!(
                request_id = %self.request_id(),
                steps = ?self.completed_steps(),
                "Settlement abandoned before completion, compensating"
            );
            let outcome = self.unwind();
            if outcome.needs_reconciliation() {
                error!(
                    request_id = %self.request_id(),
                    outcome = %outcome,
                    "Abandoned settlement could not be rolled back"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::faults::{FaultyLedger, LedgerOp};
    use crate::core::{InMemoryLedgerStore, InMemoryRequestStore, InMemoryTransactionLog};
    use crate::types::{AdminAccountId, AdminWallet, FundReleaseRequest, RequestStatus};
    use std::sync::Arc;
    use uuid::Uuid;

    struct Fixture {
        requests: InMemoryRequestStore,
        ledger: Arc<InMemoryLedgerStore>,
        log: InMemoryTransactionLog,
        request: FundReleaseRequest,
    }

    fn fixture() -> Fixture {
        let request = FundReleaseRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Jazz Night",
            Decimal::new(20000, 2),
            40,
        )
        .unwrap();
        let requests = InMemoryRequestStore::new();
        requests.insert(request.clone()).unwrap();
        let ledger = Arc::new(InMemoryLedgerStore::new(AdminWallet::with_totals(
            AdminAccountId::default(),
            Decimal::new(100000, 2),
            Decimal::ZERO,
        )));
        Fixture {
            requests,
            ledger,
            log: InMemoryTransactionLog::new(),
            request,
        }
    }

    fn admin() -> AccountRef {
        AccountRef::Admin(AdminAccountId::default())
    }

    #[test]
    fn test_rollback_of_claim_only_is_nothing_committed() {
        let f = fixture();
        let claim = f.requests.claim_for_settlement(f.request.request_id).unwrap();
        let saga = SettlementSaga::begin(claim, &f.requests, f.ledger.as_ref(), &f.log);

        assert_eq!(saga.rollback(), RollbackOutcome::NothingCommitted);
        assert!(!f.requests.is_claimed(f.request.request_id));
    }

    #[test]
    fn test_rollback_reverts_in_reverse_order() {
        let f = fixture();
        let claim = f.requests.claim_for_settlement(f.request.request_id).unwrap();
        let mut saga = SettlementSaga::begin(claim, &f.requests, f.ledger.as_ref(), &f.log);
        let amount = f.request.amount;
        let client = AccountRef::Client(Uuid::new_v4());

        saga.run(
            SettlementStep::DebitAdmin,
            Compensation::RevertDebit {
                account: admin(),
                amount,
            },
            || f.ledger.debit(&admin(), amount),
        )
        .unwrap();
        saga.run_with(
            SettlementStep::CreditClient,
            || f.ledger.credit(&client, amount),
            |opened| Compensation::RevertCredit {
                account: client.clone(),
                amount,
                opened: *opened,
            },
        )
        .unwrap();

        let outcome = saga.rollback();

        assert_eq!(
            outcome,
            RollbackOutcome::RolledBack {
                compensated: vec![SettlementStep::CreditClient, SettlementStep::DebitAdmin]
            }
        );
        let wallet = f.ledger.admin_wallet(&AdminAccountId::default()).unwrap();
        assert_eq!(wallet.balance, Decimal::new(100000, 2));
        assert_eq!(wallet.total_withdrawals, Decimal::ZERO);
        assert!(f.ledger.client_wallets().unwrap().is_empty());
        assert!(!f.requests.is_claimed(f.request.request_id));
    }

    #[test]
    fn test_failed_step_is_not_recorded() {
        let f = fixture();
        let claim = f.requests.claim_for_settlement(f.request.request_id).unwrap();
        let mut saga = SettlementSaga::begin(claim, &f.requests, f.ledger.as_ref(), &f.log);

        let result: Result<(), StoreError> = saga.run(
            SettlementStep::DebitAdmin,
            Compensation::RevertDebit {
                account: admin(),
                amount: Decimal::ONE,
            },
            || Err(StoreError::unavailable("down")),
        );

        assert!(result.is_err());
        assert_eq!(saga.completed_steps(), vec![SettlementStep::Claim]);
        assert_eq!(saga.rollback(), RollbackOutcome::NothingCommitted);
    }

    #[test]
    fn test_failed_compensation_keeps_claim_and_flags_reconciliation() {
        let f = fixture();
        let faulty = FaultyLedger::new(f.ledger.clone()).fail_always(LedgerOp::RevertDebit);
        let claim = f.requests.claim_for_settlement(f.request.request_id).unwrap();
        let mut saga = SettlementSaga::begin(claim, &f.requests, &faulty, &f.log);
        let amount = f.request.amount;

        saga.run(
            SettlementStep::DebitAdmin,
            Compensation::RevertDebit {
                account: admin(),
                amount,
            },
            || faulty.debit(&admin(), amount),
        )
        .unwrap();

        let outcome = saga.rollback();

        assert!(outcome.needs_reconciliation());
        assert!(f.requests.is_claimed(f.request.request_id));
        assert_eq!(
            f.requests.get(f.request.request_id).unwrap().status,
            RequestStatus::Pending
        );
    }

    #[test]
    fn test_dropping_open_saga_releases_claim() {
        let f = fixture();
        let claim = f.requests.claim_for_settlement(f.request.request_id).unwrap();
        {
            let _saga = SettlementSaga::begin(claim, &f.requests, f.ledger.as_ref(), &f.log);
            assert!(f.requests.is_claimed(f.request.request_id));
        }
        assert!(!f.requests.is_claimed(f.request.request_id));
    }

    #[test]
    fn test_commit_keeps_effects() {
        let f = fixture();
        let claim = f.requests.claim_for_settlement(f.request.request_id).unwrap();
        let mut saga = SettlementSaga::begin(claim, &f.requests, f.ledger.as_ref(), &f.log);
        let amount = f.request.amount;

        saga.run(
            SettlementStep::DebitAdmin,
            Compensation::RevertDebit {
                account: admin(),
                amount,
            },
            || f.ledger.debit(&admin(), amount),
        )
        .unwrap();
        f.requests
            .set_status(f.request.request_id, saga.claim(), RequestStatus::Approved)
            .unwrap();
        saga.commit();

        let wallet = f.ledger.admin_wallet(&AdminAccountId::default()).unwrap();
        assert_eq!(wallet.total_withdrawals, amount);
    }
}
