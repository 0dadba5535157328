//! In-memory settlement audit log
//!
//! Stores admin-side and client-side audit records in two `DashMap`s keyed by
//! transaction ID. Entries are immutable once written; the only removal path is
//! retraction by a settlement that is rolling itself back.

use super::traits::TransactionLog;
use crate::types::{ClientTransaction, LedgerTransaction, StoreError, TransactionId};
use dashmap::DashMap;

/// Thread-safe audit log backed by `DashMap`
#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    admin: DashMap<TransactionId, LedgerTransaction>,
    client: DashMap<TransactionId, ClientTransaction>,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionLog for InMemoryTransactionLog {
    fn append_admin(&self, entry: LedgerTransaction) -> Result<(), StoreError> {
        let transaction_id = entry.transaction_id;
        let mut appended = false;
        self.admin.entry(transaction_id).or_insert_with(|| {
            appended = true;
            entry
        });
        if appended {
            Ok(())
        } else {
            Err(StoreError::duplicate("ledger transaction", transaction_id))
        }
    }

    fn append_client(&self, entry: ClientTransaction) -> Result<(), StoreError> {
        let transaction_id = entry.transaction_id;
        let mut appended = false;
        self.client.entry(transaction_id).or_insert_with(|| {
            appended = true;
            entry
        });
        if appended {
            Ok(())
        } else {
            Err(StoreError::duplicate("client transaction", transaction_id))
        }
    }

    fn retract_admin(&self, transaction_id: TransactionId) -> Result<(), StoreError> {
        self.admin
            .remove(&transaction_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("ledger transaction", transaction_id))
    }

    fn retract_client(&self, transaction_id: TransactionId) -> Result<(), StoreError> {
        self.client
            .remove(&transaction_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("client transaction", transaction_id))
    }

    fn admin_entries(&self) -> Result<Vec<LedgerTransaction>, StoreError> {
        let mut entries: Vec<LedgerTransaction> =
            self.admin.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.transaction_id.cmp(&b.transaction_id))
        });
        Ok(entries)
    }

    fn client_entries(&self) -> Result<Vec<ClientTransaction>, StoreError> {
        let mut entries: Vec<ClientTransaction> =
            self.client.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| {
            a.date_of_payment
                .cmp(&b.date_of_payment)
                .then_with(|| a.transaction_id.cmp(&b.transaction_id))
        });
        Ok(entries)
    }
}
