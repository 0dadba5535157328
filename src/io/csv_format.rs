//! CSV format handling for seed data, decisions and output
//!
//! This module centralizes all CSV format concerns, providing:
//! - Record structures for deserialization of each input file
//! - Conversion from CSV records to domain types
//! - Wallet and request output serialization
//!
//! All functions are pure (no file I/O) for easy testing.
//!
//! # Formats
//!
//! | File          | Columns                                                        |
//! |---------------|----------------------------------------------------------------|
//! | requests      | `request_id,event_id,event_name,amount,tickets[,status]`      |
//! | events        | `event_id,client_id`                                           |
//! | wallets       | `account,balance,total_deposits,total_withdrawals`             |
//! | decisions     | `request_id,status`                                            |
//!
//! In the wallets file the admin row is the one whose `account` equals the
//! configured admin email; every other row must be a client UUID.

use crate::gateway::ApproveFundReleaseRequest;
use crate::types::{
    AdminAccountId, AdminWallet, ClientId, ClientWallet, EventId, FundReleaseRequest,
    RequestStatus,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;
use uuid::Uuid;

/// Row of the requests seed file
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RequestRecord {
    pub request_id: Uuid,
    pub event_id: Uuid,
    pub event_name: String,
    pub amount: String,
    pub tickets: u32,
    /// Missing or empty means `pending`
    pub status: Option<String>,
}

/// Row of the events seed file
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct EventRecord {
    pub event_id: EventId,
    pub client_id: ClientId,
}

/// Row of the wallets seed file
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WalletRecord {
    pub account: String,
    pub balance: String,
    pub total_deposits: String,
    pub total_withdrawals: Option<String>,
}

/// Row of the decisions file
///
/// Fields are kept as raw strings; the gateway validates them.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DecisionRecord {
    pub request_id: String,
    pub status: String,
}

impl From<DecisionRecord> for ApproveFundReleaseRequest {
    fn from(record: DecisionRecord) -> Self {
        ApproveFundReleaseRequest {
            request_id: record.request_id,
            status: record.status,
        }
    }
}

/// A wallet row resolved to the account it seeds
#[derive(Debug, Clone, PartialEq)]
pub enum WalletSeed {
    Admin(AdminWallet),
    Client(ClientWallet),
}

fn parse_decimal(field: &str, value: &str, context: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim())
        .map_err(|_| format!("Invalid {} '{}' for {}", field, value, context))
}

fn parse_optional_decimal(
    field: &str,
    value: Option<&str>,
    context: &str,
) -> Result<Decimal, String> {
    match value {
        Some(v) if !v.trim().is_empty() => parse_decimal(field, v, context),
        _ => Ok(Decimal::ZERO),
    }
}

/// Convert a RequestRecord to a FundReleaseRequest
///
/// # Returns
///
/// * `Ok(FundReleaseRequest)` - Successfully converted record
/// * `Err(String)` - The amount or status could not be parsed, or the amount
///   is not a positive value with at most two decimal places
pub fn convert_request_record(record: RequestRecord) -> Result<FundReleaseRequest, String> {
    let context = format!("request {}", record.request_id);
    let amount = parse_decimal("amount", &record.amount, &context)?;

    let status = match record.status.as_deref() {
        Some(s) if !s.trim().is_empty() => RequestStatus::from_str(s)
            .map_err(|e| format!("{} for {}", e, context))?,
        _ => RequestStatus::Pending,
    };

    let request = FundReleaseRequest::new(
        record.request_id,
        record.event_id,
        record.event_name,
        amount,
        record.tickets,
    )
    .map_err(|e| e.to_string())?;

    Ok(request.with_status(status))
}

/// Convert a WalletRecord to the admin or client wallet it seeds
///
/// The admin row must satisfy `balance == total_deposits - total_withdrawals`.
/// Client rows carry no withdrawals.
pub fn convert_wallet_record(
    record: WalletRecord,
    admin: &AdminAccountId,
) -> Result<WalletSeed, String> {
    let account = record.account.trim();
    let context = format!("wallet '{}'", account);
    let balance = parse_decimal("balance", &record.balance, &context)?;
    let deposits = parse_decimal("total_deposits", &record.total_deposits, &context)?;
    let withdrawals = parse_optional_decimal(
        "total_withdrawals",
        record.total_withdrawals.as_deref(),
        &context,
    )?;

    if account == admin.as_str() {
        let wallet = AdminWallet::with_totals(admin.clone(), deposits, withdrawals);
        if wallet.balance != balance {
            return Err(format!(
                "Admin wallet balance {} does not equal deposits {} minus withdrawals {}",
                balance, deposits, withdrawals
            ));
        }
        return Ok(WalletSeed::Admin(wallet));
    }

    let client_id = Uuid::from_str(account).map_err(|_| {
        format!(
            "Unknown account '{}': expected a client UUID or the admin email '{}'",
            account, admin
        )
    })?;
    if !withdrawals.is_zero() {
        return Err(format!("Client {} cannot carry withdrawals", client_id));
    }
    Ok(WalletSeed::Client(ClientWallet::with_balance(
        client_id, balance, deposits,
    )))
}

/// Write wallet states to CSV format
///
/// Writes wallets with columns: account, balance, total_deposits,
/// total_withdrawals. The admin wallet comes first, then client wallets
/// sorted by client ID for deterministic output.
pub fn write_wallets_csv(
    admin: &AdminWallet,
    clients: &[ClientWallet],
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "balance", "total_deposits", "total_withdrawals"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    writer
        .write_record(&[
            admin.email.to_string(),
            format!("{:.2}", admin.balance),
            format!("{:.2}", admin.total_deposits),
            format!("{:.2}", admin.total_withdrawals),
        ])
        .map_err(|e| format!("Failed to write admin wallet record: {}", e))?;

    let mut sorted_clients = clients.to_vec();
    sorted_clients.sort_by_key(|wallet| wallet.client_id);

    for wallet in sorted_clients {
        writer
            .write_record(&[
                wallet.client_id.to_string(),
                format!("{:.2}", wallet.balance),
                format!("{:.2}", wallet.total_deposits),
                format!("{:.2}", Decimal::ZERO),
            ])
            .map_err(|e| format!("Failed to write client wallet record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write request states to CSV format, in the order given
pub fn write_requests_csv(
    requests: &[FundReleaseRequest],
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "request_id",
            "event_id",
            "event_name",
            "amount",
            "tickets",
            "status",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for request in requests {
        writer
            .write_record(&[
                request.request_id.to_string(),
                request.event_id.to_string(),
                request.event_name.clone(),
                format!("{:.2}", request.amount),
                request.tickets.to_string(),
                request.status.to_string(),
            ])
            .map_err(|e| format!("Failed to write request record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
