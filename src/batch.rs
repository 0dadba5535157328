//! Batch decision driver
//!
//! Seeds the in-memory backend from CSV files, applies a file of admin
//! decisions through [`AdminService`], and writes the resulting wallet states.
//!
//! # Pipeline
//!
//! ```text
//! wallets.csv ──┐
//! requests.csv ─┼──> InMemoryBackend ──> AdminService
//! events.csv ───┘                            │
//! decisions.csv ──> buffer_unordered(max_concurrent)
//!                                            │
//!                        stdout <── wallets CSV (admin first, clients by id)
//!                 --requests-out <── request statuses
//! ```
//!
//! Seed errors are fatal. Decisions that fail are logged and counted; the
//! remaining decisions still run. Decisions are applied concurrently, so two
//! decisions on the same request race and exactly one of them wins.

use crate::config::ServiceConfig;
use crate::core::{FundReleaseRequestStore, InMemoryBackend, LedgerStore};
use crate::gateway::{AdminService, ApproveFundReleaseRequest, Status};
use crate::io::{
    convert_request_record, convert_wallet_record, load_records, write_requests_csv,
    write_wallets_csv, DecisionRecord, EventRecord, RecordReader, RequestRecord, WalletRecord,
    WalletSeed,
};
use crate::types::{AdminWallet, ClientWallet, ErrorKind};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// Files consumed and produced by one batch run
#[derive(Debug, Clone, Default)]
pub struct BatchInputs {
    /// Decisions to apply (`request_id,status`)
    pub decisions: PathBuf,
    pub requests: Option<PathBuf>,
    pub events: Option<PathBuf>,
    pub wallets: Option<PathBuf>,
    /// Where to write final request statuses, if anywhere
    pub requests_out: Option<PathBuf>,
}

/// Counts of decision outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub applied: usize,
    /// Failed decisions per error kind
    pub failed: BTreeMap<String, usize>,
    /// Rows of the decisions file that could not be parsed
    pub skipped: usize,
}

impl BatchSummary {
    pub fn failed_total(&self) -> usize {
        self.failed.values().sum()
    }

    fn record_failure(&mut self, code: ErrorKind) {
        *self.failed.entry(code.to_string()).or_insert(0) += 1;
    }
}

/// Runs a batch of decisions against freshly seeded stores
#[derive(Debug, Clone)]
pub struct BatchRunner {
    config: ServiceConfig,
}

impl BatchRunner {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    /// Seed, apply decisions and write the wallets CSV to `output`
    ///
    /// # Errors
    ///
    /// Returns an error if a seed file cannot be read or contains a bad row,
    /// the decisions file cannot be opened, the runtime cannot be created, or
    /// output cannot be written. Individual decision failures are not errors.
    pub fn process(
        &self,
        inputs: &BatchInputs,
        output: &mut dyn Write,
    ) -> Result<BatchSummary, String> {
        let backend = self.seed(inputs)?;
        let service = AdminService::new(backend.collaborators(), &self.config);

        let mut summary = BatchSummary::default();
        let mut decisions = Vec::new();
        for row in RecordReader::<DecisionRecord>::open(&inputs.decisions)? {
            match row {
                Ok(record) => decisions.push(ApproveFundReleaseRequest::from(record)),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable decision row");
                    summary.skipped += 1;
                }
            }
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent)
            .enable_time()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let results = runtime.block_on(apply_decisions(
            &service,
            decisions,
            self.config.max_concurrent,
        ));
        for result in results {
            match result {
                Ok(()) => summary.applied += 1,
                Err(status) => summary.record_failure(status.code),
            }
        }

        info!(
            applied = summary.applied,
            failed = summary.failed_total(),
            skipped = summary.skipped,
            "Batch complete"
        );

        let admin = backend
            .ledger
            .admin_wallet(&self.config.admin_account)
            .map_err(|e| format!("Failed to read admin wallet: {}", e))?;
        let clients = backend
            .ledger
            .client_wallets()
            .map_err(|e| format!("Failed to read client wallets: {}", e))?;
        write_wallets_csv(&admin, &clients, output)?;

        if let Some(path) = &inputs.requests_out {
            let requests = backend
                .requests
                .list()
                .map_err(|e| format!("Failed to list requests: {}", e))?;
            let file = File::create(path)
                .map_err(|e| format!("Failed to create file '{}': {}", path.display(), e))?;
            let mut writer = BufWriter::new(file);
            write_requests_csv(&requests, &mut writer)?;
        }

        Ok(summary)
    }

    /// Build the in-memory backend from the seed files
    fn seed(&self, inputs: &BatchInputs) -> Result<InMemoryBackend, String> {
        let admin_id = &self.config.admin_account;

        let mut admin_wallet: Option<AdminWallet> = None;
        let mut client_wallets: Vec<ClientWallet> = Vec::new();
        if let Some(path) = &inputs.wallets {
            let seeds = load_records::<WalletRecord, _, _>(path, |record| {
                convert_wallet_record(record, admin_id)
            })?;
            for seed in seeds {
                match seed {
                    WalletSeed::Admin(wallet) => {
                        if admin_wallet.replace(wallet).is_some() {
                            return Err(format!(
                                "{}: admin wallet '{}' listed more than once",
                                path.display(),
                                admin_id
                            ));
                        }
                    }
                    WalletSeed::Client(wallet) => client_wallets.push(wallet),
                }
            }
        }

        let backend = InMemoryBackend::new(
            admin_wallet.unwrap_or_else(|| AdminWallet::new(admin_id.clone())),
        );

        let mut seen_clients = HashSet::new();
        for wallet in client_wallets {
            if !seen_clients.insert(wallet.client_id) {
                return Err(format!(
                    "Client wallet {} listed more than once",
                    wallet.client_id
                ));
            }
            backend.ledger.open_client_wallet(wallet);
        }

        if let Some(path) = &inputs.events {
            let events = load_records::<EventRecord, _, _>(path, Ok)?;
            let mut seen_events = HashSet::new();
            for event in events {
                if !seen_events.insert(event.event_id) {
                    return Err(format!(
                        "{}: event {} listed more than once",
                        path.display(),
                        event.event_id
                    ));
                }
                backend.events.register(event.event_id, event.client_id);
            }
        }

        if let Some(path) = &inputs.requests {
            let requests = load_records::<RequestRecord, _, _>(path, convert_request_record)?;
            for request in requests {
                backend
                    .requests
                    .insert(request)
                    .map_err(|e| format!("{}: {}", path.display(), e))?;
            }
        }

        info!(
            admin = %admin_id,
            clients = seen_clients.len(),
            requests = backend.requests.len(),
            "Seeded backend"
        );
        Ok(backend)
    }
}

/// Apply decisions with at most `max_concurrent` settlements in flight
///
/// Results come back in completion order.
pub async fn apply_decisions(
    service: &AdminService,
    decisions: Vec<ApproveFundReleaseRequest>,
    max_concurrent: usize,
) -> Vec<Result<(), Status>> {
    stream::iter(decisions)
        .map(|decision| async move {
            let request_id = decision.request_id.clone();
            let status = decision.status.clone();
            match service.approve_fund_release(decision).await {
                Ok(response) => {
                    info!(request_id = %request_id, status = %status, message = %response.message, "Decision applied");
                    Ok(())
                }
                Err(err) => {
                    warn!(request_id = %request_id, status = %status, code = %err.code, error = %err.message, "Decision failed");
                    Err(err)
                }
            }
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await
}
