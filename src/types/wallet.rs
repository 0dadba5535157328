//! Wallet types
//!
//! The ledger holds exactly two kinds of account: the single platform-held
//! admin wallet and one wallet per client (event organizer).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Client (organizer) identifier
pub type ClientId = Uuid;

/// Identity of the platform-held admin wallet
///
/// The admin wallet is addressed by a well-known email. Exactly one exists per
/// deployment; the identity is configured once rather than spelled out at each
/// call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AdminAccountId(String);

impl AdminAccountId {
    /// Email used when no admin account is configured
    pub const DEFAULT_EMAIL: &'static str = "admin@gmail.com";

    pub fn new(email: impl Into<String>) -> Self {
        AdminAccountId(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AdminAccountId {
    fn default() -> Self {
        AdminAccountId::new(Self::DEFAULT_EMAIL)
    }
}

impl fmt::Display for AdminAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a single ledger account row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccountRef {
    Admin(AdminAccountId),
    Client(ClientId),
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRef::Admin(id) => write!(f, "admin wallet {}", id),
            AccountRef::Client(id) => write!(f, "client wallet {}", id),
        }
    }
}

/// Platform-held admin wallet
///
/// Invariant: `balance == total_deposits - total_withdrawals`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminWallet {
    pub email: AdminAccountId,
    pub balance: Decimal,
    pub total_deposits: Decimal,
    pub total_withdrawals: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminWallet {
    /// Create an empty admin wallet
    pub fn new(email: AdminAccountId) -> Self {
        let now = Utc::now();
        AdminWallet {
            email,
            balance: Decimal::ZERO,
            total_deposits: Decimal::ZERO,
            total_withdrawals: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an admin wallet holding `deposits - withdrawals`
    pub fn with_totals(email: AdminAccountId, deposits: Decimal, withdrawals: Decimal) -> Self {
        AdminWallet {
            balance: deposits - withdrawals,
            total_deposits: deposits,
            total_withdrawals: withdrawals,
            ..AdminWallet::new(email)
        }
    }

    /// Whether the balance still equals deposits minus withdrawals
    pub fn is_balanced(&self) -> bool {
        self.balance == self.total_deposits - self.total_withdrawals
    }
}

/// Organizer wallet credited by fund releases
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientWallet {
    pub client_id: ClientId,
    pub balance: Decimal,
    pub total_deposits: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl ClientWallet {
    pub fn new(client_id: ClientId) -> Self {
        ClientWallet {
            client_id,
            balance: Decimal::ZERO,
            total_deposits: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }

    pub fn with_balance(client_id: ClientId, balance: Decimal, total_deposits: Decimal) -> Self {
        ClientWallet {
            balance,
            total_deposits,
            ..ClientWallet::new(client_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_wallet_with_totals_is_balanced() {
        let wallet = AdminWallet::with_totals(
            AdminAccountId::default(),
            Decimal::new(100000, 2),
            Decimal::new(25000, 2),
        );
        assert_eq!(wallet.balance, Decimal::new(75000, 2));
        assert!(wallet.is_balanced());
    }

    #[test]
    fn test_account_ref_display() {
        let client = Uuid::nil();
        assert_eq!(
            AccountRef::Admin(AdminAccountId::default()).to_string(),
            "admin wallet admin@gmail.com"
        );
        assert_eq!(
            AccountRef::Client(client).to_string(),
            "client wallet 00000000-0000-0000-0000-000000000000"
        );
    }
}
