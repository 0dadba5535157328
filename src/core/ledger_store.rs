//! In-memory wallet ledger
//!
//! This module provides `InMemoryLedgerStore`, the `DashMap`-backed
//! implementation of [`LedgerStore`].
//!
//! # Atomicity
//!
//! Each debit or credit runs while holding the account row's write guard. The
//! new counters are computed on a copy with checked arithmetic and written back
//! only if every step succeeded, so a failed update leaves the row untouched
//! and two concurrent updates on the same row can never lose one another.
//!
//! A floored debit checks the resulting balance inside the same guarded update,
//! so concurrent debits against one wallet cannot both pass the check.
//!
//! # Accounts
//!
//! The store holds exactly one admin wallet, fixed at construction. Client
//! wallets are opened on first credit and closed again if that credit is
//! reverted before anything else lands on them.

use super::traits::LedgerStore;
use crate::types::request::validate_amount;
use crate::types::{AccountRef, AdminAccountId, AdminWallet, ClientId, ClientWallet, StoreError};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;

/// Thread-safe wallet ledger backed by `DashMap`
#[derive(Debug)]
pub struct InMemoryLedgerStore {
    admin: DashMap<AdminAccountId, AdminWallet>,
    clients: DashMap<ClientId, ClientWallet>,
}

impl InMemoryLedgerStore {
    /// Create a ledger holding the given admin wallet and no client wallets
    pub fn new(admin_wallet: AdminWallet) -> Self {
        let admin = DashMap::new();
        admin.insert(admin_wallet.email.clone(), admin_wallet);
        Self {
            admin,
            clients: DashMap::new(),
        }
    }

    /// Seed a client wallet, replacing any existing one
    pub fn open_client_wallet(&self, wallet: ClientWallet) {
        self.clients.insert(wallet.client_id, wallet);
    }

    /// Apply `f` to a copy of the admin wallet and commit it on success
    fn update_admin<F>(&self, id: &AdminAccountId, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut AdminWallet) -> Result<(), StoreError>,
    {
        let mut entry = self
            .admin
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("admin wallet", id))?;
        let mut next = entry.value().clone();
        f(&mut next)?;
        next.updated_at = Utc::now();
        *entry.value_mut() = next;
        Ok(())
    }

    /// Apply `f` to a copy of a client wallet and commit it on success
    ///
    /// When `open` is set a missing wallet is created with zero balances;
    /// otherwise a missing wallet is `NotFound`. Returns whether the wallet was
    /// opened by this call.
    fn update_client<F>(&self, client_id: ClientId, open: bool, f: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut ClientWallet) -> Result<(), StoreError>,
    {
        let mut opened = false;
        let mut entry = if open {
            self.clients.entry(client_id).or_insert_with(|| {
                opened = true;
                ClientWallet::new(client_id)
            })
        } else {
            self.clients
                .get_mut(&client_id)
                .ok_or_else(|| StoreError::not_found("client wallet", client_id))?
        };
        let mut next = entry.value().clone();
        if let Err(err) = f(&mut next) {
            drop(entry);
            if opened {
                self.clients
                    .remove_if(&client_id, |_, wallet| is_empty(wallet));
            }
            return Err(err);
        }
        next.updated_at = Utc::now();
        *entry.value_mut() = next;
        Ok(opened)
    }
}

fn is_empty(wallet: &ClientWallet) -> bool {
    wallet.balance.is_zero() && wallet.total_deposits.is_zero()
}

fn checked_add(
    value: Decimal,
    amount: Decimal,
    operation: &str,
    account: &AccountRef,
) -> Result<Decimal, StoreError> {
    value
        .checked_add(amount)
        .ok_or_else(|| StoreError::arithmetic_overflow(operation, account))
}

fn checked_sub(
    value: Decimal,
    amount: Decimal,
    operation: &str,
    account: &AccountRef,
) -> Result<Decimal, StoreError> {
    value
        .checked_sub(amount)
        .ok_or_else(|| StoreError::arithmetic_overflow(operation, account))
}

/// Balance after debiting `amount`, refused if it would fall below `floor`
fn debited_balance(
    balance: Decimal,
    amount: Decimal,
    floor: Option<Decimal>,
    account: &AccountRef,
) -> Result<Decimal, StoreError> {
    let next = checked_sub(balance, amount, "debit", account)?;
    if let Some(floor) = floor {
        if next < floor {
            return Err(StoreError::insufficient_funds(account, balance, amount));
        }
    }
    Ok(next)
}

/// Reverting must never take a running total below zero
fn revert_total(
    total: Decimal,
    amount: Decimal,
    operation: &str,
    account: &AccountRef,
) -> Result<Decimal, StoreError> {
    if total < amount {
        return Err(StoreError::arithmetic_underflow(operation, account));
    }
    checked_sub(total, amount, operation, account)
}

impl LedgerStore for InMemoryLedgerStore {
    fn debit_with_floor(
        &self,
        account: &AccountRef,
        amount: Decimal,
        floor: Option<Decimal>,
    ) -> Result<(), StoreError> {
        validate_amount(&account.to_string(), amount)?;
        match account {
            AccountRef::Admin(id) => self.update_admin(id, |wallet| {
                wallet.balance = debited_balance(wallet.balance, amount, floor, account)?;
                wallet.total_withdrawals =
                    checked_add(wallet.total_withdrawals, amount, "debit", account)?;
                Ok(())
            }),
            AccountRef::Client(client_id) => self
                .update_client(*client_id, false, |wallet| {
                    wallet.balance = debited_balance(wallet.balance, amount, floor, account)?;
                    Ok(())
                })
                .map(|_| ()),
        }
    }

    fn credit(&self, account: &AccountRef, amount: Decimal) -> Result<bool, StoreError> {
        validate_amount(&account.to_string(), amount)?;
        match account {
            AccountRef::Admin(id) => self
                .update_admin(id, |wallet| {
                    wallet.balance = checked_add(wallet.balance, amount, "credit", account)?;
                    wallet.total_deposits =
                        checked_add(wallet.total_deposits, amount, "credit", account)?;
                    Ok(())
                })
                .map(|()| false),
            AccountRef::Client(client_id) => self.update_client(*client_id, true, |wallet| {
                wallet.balance = checked_add(wallet.balance, amount, "credit", account)?;
                wallet.total_deposits =
                    checked_add(wallet.total_deposits, amount, "credit", account)?;
                Ok(())
            }),
        }
    }

    fn revert_debit(&self, account: &AccountRef, amount: Decimal) -> Result<(), StoreError> {
        validate_amount(&account.to_string(), amount)?;
        match account {
            AccountRef::Admin(id) => self.update_admin(id, |wallet| {
                wallet.total_withdrawals =
                    revert_total(wallet.total_withdrawals, amount, "revert debit", account)?;
                wallet.balance = checked_add(wallet.balance, amount, "revert debit", account)?;
                Ok(())
            }),
            AccountRef::Client(client_id) => self
                .update_client(*client_id, false, |wallet| {
                    wallet.balance = checked_add(wallet.balance, amount, "revert debit", account)?;
                    Ok(())
                })
                .map(|_| ()),
        }
    }

    fn revert_credit(
        &self,
        account: &AccountRef,
        amount: Decimal,
        opened: bool,
    ) -> Result<(), StoreError> {
        validate_amount(&account.to_string(), amount)?;
        match account {
            AccountRef::Admin(id) => self.update_admin(id, |wallet| {
                wallet.total_deposits =
                    revert_total(wallet.total_deposits, amount, "revert credit", account)?;
                wallet.balance = checked_sub(wallet.balance, amount, "revert credit", account)?;
                Ok(())
            }),
            AccountRef::Client(client_id) => {
                // Close the wallet only if it still holds nothing but this credit
                if opened
                    && self
                        .clients
                        .remove_if(client_id, |_, wallet| {
                            wallet.balance == amount && wallet.total_deposits == amount
                        })
                        .is_some()
                {
                    return Ok(());
                }
                self.update_client(*client_id, false, |wallet| {
                    wallet.total_deposits =
                        revert_total(wallet.total_deposits, amount, "revert credit", account)?;
                    wallet.balance =
                        checked_sub(wallet.balance, amount, "revert credit", account)?;
                    Ok(())
                })
                .map(|_| ())
            }
        }
    }

    fn admin_wallet(&self, id: &AdminAccountId) -> Result<AdminWallet, StoreError> {
        self.admin
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found("admin wallet", id))
    }

    fn client_wallet(&self, client_id: ClientId) -> Result<ClientWallet, StoreError> {
        self.clients
            .get(&client_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found("client wallet", client_id))
    }

    fn client_wallets(&self) -> Result<Vec<ClientWallet>, StoreError> {
        let mut wallets: Vec<ClientWallet> = self
            .clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        wallets.sort_by_key(|wallet| wallet.client_id);
        Ok(wallets)
    }
}
