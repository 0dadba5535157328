//! Fund-release request types
//!
//! This module defines the fund-release request entity, its lifecycle status,
//! the operator decision applied to it, and the settlement claim that guards a
//! request while a single settlement is in flight.

use super::error::StoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Fund-release request identifier
pub type RequestId = Uuid;

/// Event identifier (the event whose proceeds are being released)
pub type EventId = Uuid;

/// Opaque token identifying the holder of a settlement claim
pub type ClaimToken = Uuid;

/// Number of decimal places allowed in request amounts (currency minor units)
pub const AMOUNT_SCALE: u32 = 2;

/// Lifecycle status of a fund-release request
///
/// A request is created `Pending` and moves exactly once to one of the two
/// terminal values. Terminal requests are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Awaiting admin adjudication
    Pending,
    /// Funds released; wallet and ledger effects committed
    Approved,
    /// Release refused; no wallet or ledger effects
    Rejected,
}

impl RequestStatus {
    /// Whether this status is final
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(format!("Invalid request status: '{}'", other)),
        }
    }
}

/// Operator decision on a pending request
///
/// Parsing is exact: only the lowercase wire values `approved` and `rejected`
/// are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    /// The terminal status this decision moves a request to
    pub fn target_status(self) -> RequestStatus {
        match self {
            Decision::Approved => RequestStatus::Approved,
            Decision::Rejected => RequestStatus::Rejected,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.target_status().as_str()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Decision::Approved),
            "rejected" => Ok(Decision::Rejected),
            _ => Err("Invalid status. Allowed values: 'approved', 'rejected'".to_string()),
        }
    }
}

/// A claim by an organizer for funds held by the platform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundReleaseRequest {
    pub request_id: RequestId,
    pub event_id: EventId,
    pub event_name: String,

    /// Amount to release, positive, at most [`AMOUNT_SCALE`] decimal places
    pub amount: Decimal,

    /// Tickets sold for the event (informational only)
    pub tickets: u32,

    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FundReleaseRequest {
    /// Create a new pending request
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidAmount` if `amount` is not positive or has
    /// more than [`AMOUNT_SCALE`] decimal places.
    pub fn new(
        request_id: RequestId,
        event_id: EventId,
        event_name: impl Into<String>,
        amount: Decimal,
        tickets: u32,
    ) -> Result<Self, StoreError> {
        validate_amount(&format!("fund release request {}", request_id), amount)?;
        let now = Utc::now();
        Ok(FundReleaseRequest {
            request_id,
            event_id,
            event_name: event_name.into(),
            amount,
            tickets,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Builder-style override of the initial status (used when seeding)
    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.status = status;
        self
    }
}

/// Validate a monetary amount: positive and within minor-unit precision
pub fn validate_amount(context: &str, amount: Decimal) -> Result<(), StoreError> {
    if amount <= Decimal::ZERO || amount.normalize().scale() > AMOUNT_SCALE {
        return Err(StoreError::invalid_amount(context, amount));
    }
    Ok(())
}

/// Proof that the holder won the compare-and-set on a pending request
///
/// Carries a snapshot of the request taken under the same lock as the claim,
/// so the settlement works from the exact state it claimed.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementClaim {
    token: ClaimToken,
    request: FundReleaseRequest,
    claimed_at: DateTime<Utc>,
}

impl SettlementClaim {
    pub fn new(request: FundReleaseRequest) -> Self {
        SettlementClaim {
            token: Uuid::new_v4(),
            request,
            claimed_at: Utc::now(),
        }
    }

    pub fn token(&self) -> ClaimToken {
        self.token
    }

    pub fn request(&self) -> &FundReleaseRequest {
        &self.request
    }

    pub fn request_id(&self) -> RequestId {
        self.request.request_id
    }

    pub fn claimed_at(&self) -> DateTime<Utc> {
        self.claimed_at
    }
}
