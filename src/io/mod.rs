//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, output serialization)
//! - `reader` - Streaming CSV reader and seed-file loading

pub mod csv_format;
pub mod reader;

pub use csv_format::{
    convert_request_record, convert_wallet_record, write_requests_csv, write_wallets_csv,
    DecisionRecord, EventRecord, RequestRecord, WalletRecord, WalletSeed,
};
pub use reader::{load_records, RecordReader};
