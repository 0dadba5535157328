//! Fund-Release Admin Service Library
//! # Overview
//!
//! This library implements the admin side of an event marketplace's payout
//! flow: an admin approves or rejects an organizer's request to release the
//! funds collected for an event, and an approval moves the money from the
//! platform-held admin wallet to the organizer's wallet with a matching audit
//! record on each side.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (requests, wallets, audit records, errors)
//! - [`core`] - Business logic components:
//!   - [`core::orchestrator`] - Settlement state machine
//!   - [`core::saga`] - Compensation log that keeps settlements all-or-nothing
//!   - [`core::traits`] - Collaborator abstractions and their in-memory stores
//! - [`gateway`] - RPC-shaped admin operations with input validation
//! - [`config`] - Service configuration
//! - [`batch`] - CSV-driven batch driver used by the binary
//! - [`io`] - CSV parsing and output
//! - [`cli`] - CLI arguments parsing
//!
//! # Request Lifecycle
//!
//! ```text
//! Pending ──approve──> Approved   (admin wallet debited, client wallet credited)
//!    └─────reject────> Rejected   (no wallet touched)
//! ```
//!
//! Terminal statuses never change. A second decision on the same request
//! fails with `Conflict`, which makes retries safe.

pub mod batch;
pub mod cli;
pub mod config;
pub mod core;
pub mod gateway;
pub mod io;
pub mod telemetry;
pub mod types;

pub use crate::core::{Collaborators, InMemoryBackend, SettlementOrchestrator, SettlementReceipt};
pub use config::{OverdraftPolicy, ServiceConfig};
pub use gateway::{AdminService, Status};
pub use types::{
    AdminAccountId, Decision, ErrorKind, FundReleaseRequest, RequestId, RequestStatus,
    SettlementError, StoreError,
};
