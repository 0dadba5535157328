//! Error types for the fund-release admin service
//!
//! Two layers of errors exist:
//!
//! - [`StoreError`] is returned by collaborators (stores, resolver, directory).
//! - [`SettlementError`] is returned by the settlement orchestrator and carries
//!   enough context to tell "nothing committed" apart from "partially
//!   committed, rolled back" and "rollback failed".
//!
//! Both map onto the caller-visible [`ErrorKind`] taxonomy.
//!
//! # Error Categories
//!
//! - **InvalidArgument**: malformed input, rejected before any store call
//! - **NotFound**: unknown request, event, owner, user or category request
//! - **Conflict**: request already terminal or already being settled
//! - **FailedPrecondition**: settlement refused by the overdraft policy
//! - **DeadlineExceeded**: caller deadline expired before any mutation
//! - **Internal**: storage or resolver failure, or a failed rollback

use super::request::{RequestId, RequestStatus};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Caller-visible error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Conflict,
    FailedPrecondition,
    DeadlineExceeded,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::FailedPrecondition => "FailedPrecondition",
            ErrorKind::DeadlineExceeded => "DeadlineExceeded",
            ErrorKind::Internal => "Internal",
        };
        f.write_str(name)
    }
}

/// Error returned by storage and lookup collaborators
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// No row exists for the given identity
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity looked up (e.g. "fund release request")
        entity: &'static str,
        /// The identity that was not found
        id: String,
    },

    /// The request already reached a terminal status
    #[error("Fund release request {request} is already {status}")]
    AlreadyTerminal {
        request: RequestId,
        status: RequestStatus,
    },

    /// Another settlement holds the claim on this request
    #[error("Fund release request {request} is already being settled")]
    SettlementInProgress { request: RequestId },

    /// The caller does not hold the claim it presented
    #[error("Settlement claim on fund release request {request} is not held by the caller")]
    ClaimMismatch { request: RequestId },

    /// A transition the state machine does not allow
    #[error("Fund release request {request} cannot move from {from} to {to}")]
    InvalidTransition {
        request: RequestId,
        from: RequestStatus,
        to: RequestStatus,
    },

    /// An entity with the same identity already exists
    #[error("Duplicate {entity} {id}")]
    Duplicate { entity: &'static str, id: String },

    /// Amount is not positive or exceeds minor-unit precision
    #[error("Invalid amount {amount} for {context}")]
    InvalidAmount { context: String, amount: Decimal },

    /// A floored debit would take the balance below the floor
    #[error("Insufficient balance in {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        account: String,
        available: Decimal,
        requested: Decimal,
    },

    /// Arithmetic overflow would occur
    #[error("Arithmetic overflow in {operation} for {account}")]
    ArithmeticOverflow { operation: String, account: String },

    /// Arithmetic underflow would occur (reverting more than was applied)
    #[error("Arithmetic underflow in {operation} for {account}")]
    ArithmeticUnderflow { operation: String, account: String },

    /// Backend could not be reached or refused the operation
    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn already_terminal(request: RequestId, status: RequestStatus) -> Self {
        StoreError::AlreadyTerminal { request, status }
    }

    pub fn duplicate(entity: &'static str, id: impl fmt::Display) -> Self {
        StoreError::Duplicate {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_amount(context: &str, amount: Decimal) -> Self {
        StoreError::InvalidAmount {
            context: context.to_string(),
            amount,
        }
    }

    pub fn insufficient_funds(
        account: impl fmt::Display,
        available: Decimal,
        requested: Decimal,
    ) -> Self {
        StoreError::InsufficientFunds {
            account: account.to_string(),
            available,
            requested,
        }
    }

    pub fn arithmetic_overflow(operation: &str, account: impl fmt::Display) -> Self {
        StoreError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: account.to_string(),
        }
    }

    pub fn arithmetic_underflow(operation: &str, account: impl fmt::Display) -> Self {
        StoreError::ArithmeticUnderflow {
            operation: operation.to_string(),
            account: account.to_string(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }

    /// Classification when the error reaches a caller unchanged
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::AlreadyTerminal { .. }
            | StoreError::SettlementInProgress { .. }
            | StoreError::Duplicate { .. } => ErrorKind::Conflict,
            StoreError::InvalidAmount { .. } => ErrorKind::InvalidArgument,
            StoreError::InsufficientFunds { .. } => ErrorKind::FailedPrecondition,
            StoreError::ClaimMismatch { .. }
            | StoreError::InvalidTransition { .. }
            | StoreError::ArithmeticOverflow { .. }
            | StoreError::ArithmeticUnderflow { .. }
            | StoreError::Unavailable { .. } => ErrorKind::Internal,
        }
    }
}

/// Steps of a settlement, in contract order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettlementStep {
    Claim,
    ResolveOwner,
    DebitAdmin,
    CreditClient,
    AppendLedgerEntry,
    AppendClientEntry,
    Finalize,
}

impl fmt::Display for SettlementStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettlementStep::Claim => "claim",
            SettlementStep::ResolveOwner => "resolve owner",
            SettlementStep::DebitAdmin => "debit admin wallet",
            SettlementStep::CreditClient => "credit client wallet",
            SettlementStep::AppendLedgerEntry => "append ledger entry",
            SettlementStep::AppendClientEntry => "append client entry",
            SettlementStep::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// A compensating action that itself failed
#[derive(Debug, Clone, PartialEq)]
pub struct CompensationFailure {
    /// The forward step whose effect could not be undone
    pub step: SettlementStep,
    pub error: StoreError,
}

/// What happened to earlier effects when a settlement failed
#[derive(Debug, Clone, PartialEq)]
pub enum RollbackOutcome {
    /// No wallet or ledger effect had been applied
    NothingCommitted,

    /// Effects were applied and every one of them was undone
    RolledBack {
        /// Forward steps that were compensated, in compensation order
        compensated: Vec<SettlementStep>,
    },

    /// At least one compensation failed; the request is left claimed and
    /// must be reconciled by hand
    ReconciliationRequired { failed: Vec<CompensationFailure> },
}

impl RollbackOutcome {
    pub fn needs_reconciliation(&self) -> bool {
        matches!(self, RollbackOutcome::ReconciliationRequired { .. })
    }
}

impl fmt::Display for RollbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackOutcome::NothingCommitted => f.write_str("nothing committed"),
            RollbackOutcome::RolledBack { compensated } => {
                let steps: Vec<String> = compensated.iter().map(|s| s.to_string()).collect();
                write!(f, "partially committed, rolled back ({})", steps.join(", "))
            }
            RollbackOutcome::ReconciliationRequired { failed } => {
                let steps: Vec<String> = failed
                    .iter()
                    .map(|c| format!("{}: {}", c.step, c.error))
                    .collect();
                write!(
                    f,
                    "rollback failed, manual reconciliation required ({})",
                    steps.join("; ")
                )
            }
        }
    }
}

/// Why a request could not be claimed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    AlreadyTerminal(RequestStatus),
    SettlementInProgress,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::AlreadyTerminal(status) => write!(f, "is already {}", status),
            ConflictReason::SettlementInProgress => f.write_str("is already being settled"),
        }
    }
}

/// Error returned by the settlement orchestrator
///
/// Every variant other than `Internal` guarantees that nothing was mutated.
/// `Internal` carries the rollback outcome for observability; callers treat it
/// as "operation failed, no effect" unless it needs reconciliation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettlementError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Fund release request {request} {reason}")]
    Conflict {
        request: RequestId,
        reason: ConflictReason,
    },

    #[error("Insufficient admin wallet balance: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },

    #[error("Deadline exceeded for fund release request {request} during {step}")]
    DeadlineExceeded {
        request: RequestId,
        step: SettlementStep,
    },

    #[error("Settlement of fund release request {request} failed at {step}: {source}; {outcome}")]
    Internal {
        request: RequestId,
        step: SettlementStep,
        source: StoreError,
        outcome: RollbackOutcome,
    },
}

impl SettlementError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SettlementError::NotFound { .. } => ErrorKind::NotFound,
            SettlementError::Conflict { .. } => ErrorKind::Conflict,
            SettlementError::InsufficientFunds { .. } => ErrorKind::FailedPrecondition,
            SettlementError::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            SettlementError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Rollback outcome, present only for `Internal` failures
    pub fn outcome(&self) -> Option<&RollbackOutcome> {
        match self {
            SettlementError::Internal { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    pub fn needs_reconciliation(&self) -> bool {
        self.outcome()
            .is_some_and(RollbackOutcome::needs_reconciliation)
    }

    /// Map a failed claim attempt onto the caller-visible taxonomy
    pub fn from_claim(request: RequestId, error: StoreError) -> Self {
        match error {
            StoreError::NotFound { entity, id } => SettlementError::NotFound { entity, id },
            StoreError::AlreadyTerminal { status, .. } => SettlementError::Conflict {
                request,
                reason: ConflictReason::AlreadyTerminal(status),
            },
            StoreError::SettlementInProgress { .. } => SettlementError::Conflict {
                request,
                reason: ConflictReason::SettlementInProgress,
            },
            other => SettlementError::Internal {
                request,
                step: SettlementStep::Claim,
                source: other,
                outcome: RollbackOutcome::NothingCommitted,
            },
        }
    }
}

/// Error raised while assembling service configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    fn request() -> RequestId {
        Uuid::nil()
    }

    #[rstest]
    #[case::not_found(
        StoreError::not_found("event", "42"),
        "event 42 not found"
    )]
    #[case::already_terminal(
        StoreError::already_terminal(Uuid::nil(), RequestStatus::Approved),
        "Fund release request 00000000-0000-0000-0000-000000000000 is already approved"
    )]
    #[case::invalid_amount(
        StoreError::invalid_amount("admin wallet admin@gmail.com", Decimal::new(-5, 0)),
        "Invalid amount -5 for admin wallet admin@gmail.com"
    )]
    #[case::unavailable(
        StoreError::unavailable("connection refused"),
        "Storage unavailable: connection refused"
    )]
    fn test_store_error_display(#[case] error: StoreError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::not_found(StoreError::not_found("fund release request", "x"), ErrorKind::NotFound)]
    #[case::terminal(StoreError::already_terminal(Uuid::nil(), RequestStatus::Rejected), ErrorKind::Conflict)]
    #[case::in_progress(StoreError::SettlementInProgress { request: Uuid::nil() }, ErrorKind::Conflict)]
    #[case::duplicate(StoreError::duplicate("category", "music"), ErrorKind::Conflict)]
    #[case::insufficient(
        StoreError::insufficient_funds("admin wallet admin@gmail.com", Decimal::ONE, Decimal::TEN),
        ErrorKind::FailedPrecondition
    )]
    #[case::unavailable(StoreError::unavailable("down"), ErrorKind::Internal)]
    fn test_store_error_kind(#[case] error: StoreError, #[case] expected: ErrorKind) {
        assert_eq!(error.kind(), expected);
    }

    #[rstest]
    #[case::not_found(
        StoreError::not_found("fund release request", "r1"),
        ErrorKind::NotFound
    )]
    #[case::terminal(
        StoreError::already_terminal(Uuid::nil(), RequestStatus::Approved),
        ErrorKind::Conflict
    )]
    #[case::in_progress(
        StoreError::SettlementInProgress { request: Uuid::nil() },
        ErrorKind::Conflict
    )]
    #[case::backend_down(StoreError::unavailable("down"), ErrorKind::Internal)]
    fn test_claim_error_mapping(#[case] error: StoreError, #[case] expected: ErrorKind) {
        assert_eq!(SettlementError::from_claim(request(), error).kind(), expected);
    }

    #[test]
    fn test_internal_error_reports_rollback_outcome() {
        let error = SettlementError::Internal {
            request: request(),
            step: SettlementStep::CreditClient,
            source: StoreError::unavailable("down"),
            outcome: RollbackOutcome::RolledBack {
                compensated: vec![SettlementStep::DebitAdmin],
            },
        };

        assert_eq!(error.kind(), ErrorKind::Internal);
        assert!(!error.needs_reconciliation());
        assert_eq!(
            error.to_string(),
            "Settlement of fund release request 00000000-0000-0000-0000-000000000000 failed at \
             credit client wallet: Storage unavailable: down; partially committed, rolled back \
             (debit admin wallet)"
        );
    }

    #[test]
    fn test_reconciliation_outcome_is_flagged() {
        let outcome = RollbackOutcome::ReconciliationRequired {
            failed: vec![CompensationFailure {
                step: SettlementStep::DebitAdmin,
                error: StoreError::unavailable("down"),
            }],
        };
        let error = SettlementError::Internal {
            request: request(),
            step: SettlementStep::Finalize,
            source: StoreError::unavailable("down"),
            outcome,
        };

        assert!(error.needs_reconciliation());
        assert!(error.to_string().contains("manual reconciliation required"));
    }

    #[test]
    fn test_conflict_display() {
        let error = SettlementError::Conflict {
            request: request(),
            reason: ConflictReason::AlreadyTerminal(RequestStatus::Approved),
        };
        assert!(error.to_string().ends_with("is already approved"));
        assert_eq!(error.kind(), ErrorKind::Conflict);
    }
}
