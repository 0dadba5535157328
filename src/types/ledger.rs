//! Settlement audit records
//!
//! Each approved settlement produces exactly one admin-side
//! [`LedgerTransaction`] and one client-side [`ClientTransaction`] describing
//! the same transfer. Both are append-only.

use super::request::RequestId;
use super::wallet::ClientId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Audit record identifier
pub type TransactionId = Uuid;

/// Transaction type and purpose recorded for every settlement
pub const FUND_RELEASE: &str = "Fund Release";

/// Admin-side status for a completed settlement
pub const STATUS_SUCCEEDED: &str = "succeeded";

/// Client-side payment method for a settlement
pub const PAYMENT_METHOD_WALLET: &str = "wallet";

/// Client-side payment status for a settlement
pub const PAYMENT_STATUS_REFUNDED: &str = "refunded";

/// Admin-side ledger entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerTransaction {
    pub transaction_id: TransactionId,
    pub request_id: RequestId,
    pub date: DateTime<Utc>,
    pub kind: String,
    pub amount: Decimal,
    pub status: String,
}

impl LedgerTransaction {
    /// Admin-side record of releasing `amount` for `request_id`
    pub fn fund_release(request_id: RequestId, amount: Decimal, date: DateTime<Utc>) -> Self {
        LedgerTransaction {
            transaction_id: Uuid::new_v4(),
            request_id,
            date,
            kind: FUND_RELEASE.to_string(),
            amount,
            status: STATUS_SUCCEEDED.to_string(),
        }
    }
}

/// Client-side payment record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientTransaction {
    pub transaction_id: TransactionId,
    pub request_id: RequestId,
    pub user_id: ClientId,
    pub purpose: String,
    pub amount_paid: Decimal,
    pub payment_method: String,
    pub date_of_payment: DateTime<Utc>,
    pub payment_status: String,
}

impl ClientTransaction {
    /// Client-side record of receiving `amount` for `request_id`
    pub fn fund_release(
        request_id: RequestId,
        user_id: ClientId,
        amount: Decimal,
        date: DateTime<Utc>,
    ) -> Self {
        ClientTransaction {
            transaction_id: Uuid::new_v4(),
            request_id,
            user_id,
            purpose: FUND_RELEASE.to_string(),
            amount_paid: amount,
            payment_method: PAYMENT_METHOD_WALLET.to_string(),
            date_of_payment: date,
            payment_status: PAYMENT_STATUS_REFUNDED.to_string(),
        }
    }
}
