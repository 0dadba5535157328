//! Fund-Release Admin CLI
//!
//! Applies a CSV file of admin decisions to seeded fund-release requests.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --wallets wallets.csv --events events.csv --requests requests.csv \
//!     decisions.csv > wallets_out.csv
//! cargo run -- --overdraft allow --deadline-ms 500 --max-concurrent 8 \
//!     --requests requests.csv --events events.csv decisions.csv
//! ```
//!
//! The final wallet states are written to stdout; logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success (individual decisions may still have failed; see the logs)
//! - 1: Error (invalid configuration, missing or malformed seed file, I/O error)

use fund_release_admin::batch::BatchRunner;
use fund_release_admin::{cli, telemetry};
use std::process;
use tracing::error;

fn main() {
    telemetry::init();

    let args = cli::parse_args();

    let config = match args.to_service_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            process::exit(1);
        }
    };

    let runner = BatchRunner::new(config);
    let mut output = std::io::stdout();
    if let Err(e) = runner.process(&args.to_batch_inputs(), &mut output) {
        error!(error = %e, "Batch failed");
        process::exit(1);
    }
}
