//! Benchmark suite for settlement throughput
//!
//! Measures approving a batch of pending fund-release requests through the
//! admin service over the in-memory backend, using the divan benchmarking
//! framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Each run seeds a fresh backend with one organizer per ten requests, so
//! concurrent settlements contend on client wallets as well as on the single
//! admin wallet.

use divan::Bencher;
use fund_release_admin::batch::apply_decisions;
use fund_release_admin::core::{FundReleaseRequestStore, InMemoryBackend};
use fund_release_admin::gateway::ApproveFundReleaseRequest;
use fund_release_admin::types::{AdminAccountId, AdminWallet};
use fund_release_admin::{AdminService, FundReleaseRequest, ServiceConfig};
use rust_decimal::Decimal;
use uuid::Uuid;

fn main() {
    divan::main();
}

const REQUESTS: usize = 1_000;

/// Backend holding `REQUESTS` pending requests and the matching approvals
fn seeded(max_concurrent: usize) -> (AdminService, Vec<ApproveFundReleaseRequest>) {
    let backend = InMemoryBackend::new(AdminWallet::with_totals(
        AdminAccountId::default(),
        Decimal::new(100_000_000, 2),
        Decimal::ZERO,
    ));

    let mut decisions = Vec::with_capacity(REQUESTS);
    for i in 0..REQUESTS {
        let event_id = Uuid::new_v4();
        let request_id = Uuid::new_v4();
        backend
            .events
            .register(event_id, Uuid::from_u128((i / 10) as u128 + 1));
        backend
            .requests
            .insert(
                FundReleaseRequest::new(request_id, event_id, "Bench Night", Decimal::new(2500, 2), 10)
                    .expect("valid request"),
            )
            .expect("unique request");
        decisions.push(ApproveFundReleaseRequest {
            request_id: request_id.to_string(),
            status: "approved".to_string(),
        });
    }

    let config = ServiceConfig {
        max_concurrent,
        ..ServiceConfig::default()
    };
    (AdminService::new(backend.collaborators(), &config), decisions)
}

/// Approve 1,000 requests with 1, 4 and 16 settlements in flight
#[divan::bench(args = [1, 4, 16])]
fn approve_batch(bencher: Bencher, max_concurrent: usize) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(max_concurrent)
        .enable_time()
        .build()
        .expect("Failed to create tokio runtime");

    bencher
        .with_inputs(|| seeded(max_concurrent))
        .bench_values(|(service, decisions)| {
            let results = runtime.block_on(apply_decisions(&service, decisions, max_concurrent));
            assert!(results.iter().all(Result::is_ok));
        });
}

/// Approve the same batch twice; the second pass is all conflicts
#[divan::bench]
fn repeated_decisions_conflict() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("Failed to create tokio runtime");
    let (service, decisions) = seeded(4);

    runtime.block_on(apply_decisions(&service, decisions.clone(), 4));
    let second = runtime.block_on(apply_decisions(&service, decisions, 4));
    assert!(second.iter().all(Result::is_err));
}
