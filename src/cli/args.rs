use crate::batch::BatchInputs;
use crate::config::{OverdraftPolicy, ServiceConfig};
use crate::types::{AdminAccountId, ConfigError};
use clap::Parser;
use std::path::PathBuf;

/// Apply admin fund-release decisions and report wallet balances
#[derive(Parser, Debug)]
#[command(name = "fund-release-admin")]
#[command(
    about = "Apply admin fund-release decisions and report wallet balances",
    long_about = None
)]
pub struct CliArgs {
    /// Decisions CSV file (request_id,status)
    #[arg(value_name = "INPUT", help = "Path to the decisions CSV file")]
    pub decisions: PathBuf,

    /// Seed file of fund-release requests
    #[arg(long = "requests", value_name = "PATH", env = "FUND_RELEASE_REQUESTS")]
    pub requests: Option<PathBuf>,

    /// Seed file mapping events to their organizers
    #[arg(long = "events", value_name = "PATH", env = "FUND_RELEASE_EVENTS")]
    pub events: Option<PathBuf>,

    /// Seed file of admin and client wallets
    #[arg(long = "wallets", value_name = "PATH", env = "FUND_RELEASE_WALLETS")]
    pub wallets: Option<PathBuf>,

    /// Write final request statuses to this file
    #[arg(long = "requests-out", value_name = "PATH")]
    pub requests_out: Option<PathBuf>,

    /// Email identifying the admin wallet
    #[arg(
        long = "admin-email",
        value_name = "EMAIL",
        env = "ADMIN_EMAIL",
        default_value = AdminAccountId::DEFAULT_EMAIL
    )]
    pub admin_email: String,

    /// What to do when the admin wallet cannot cover a release
    #[arg(
        long = "overdraft",
        value_name = "POLICY",
        env = "OVERDRAFT_POLICY",
        default_value = "reject"
    )]
    pub overdraft: OverdraftPolicy,

    /// Per-settlement deadline in milliseconds
    #[arg(
        long = "deadline-ms",
        value_name = "MS",
        env = "SETTLEMENT_DEADLINE_MS",
        help = "Per-settlement deadline in milliseconds (default: none)"
    )]
    pub deadline_ms: Option<u64>,

    /// Maximum number of settlements in flight
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        env = "MAX_CONCURRENT",
        help = "Maximum number of settlements in flight (default: CPU cores)"
    )]
    pub max_concurrent: Option<usize>,
}

impl CliArgs {
    /// Build the validated service configuration
    ///
    /// Missing values fall back to defaults; zero values are replaced by
    /// defaults with a warning.
    pub fn to_service_config(&self) -> Result<ServiceConfig, ConfigError> {
        let default = ServiceConfig::default();
        ServiceConfig::new(
            &self.admin_email,
            self.overdraft,
            self.deadline_ms,
            self.max_concurrent.unwrap_or(default.max_concurrent),
        )
    }

    pub fn to_batch_inputs(&self) -> BatchInputs {
        BatchInputs {
            decisions: self.decisions.clone(),
            requests: self.requests.clone(),
            events: self.events.clone(),
            wallets: self.wallets.clone(),
            requests_out: self.requests_out.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case::default_policy(&["program", "decisions.csv"], OverdraftPolicy::Reject)]
    #[case::explicit_reject(&["program", "--overdraft", "reject", "decisions.csv"], OverdraftPolicy::Reject)]
    #[case::explicit_allow(&["program", "--overdraft", "allow", "decisions.csv"], OverdraftPolicy::Allow)]
    fn test_overdraft_parsing(#[case] args: &[&str], #[case] expected: OverdraftPolicy) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.overdraft, expected);
    }

    #[test]
    fn test_invalid_overdraft_is_rejected() {
        let result = CliArgs::try_parse_from(["program", "--overdraft", "sometimes", "d.csv"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_input_is_rejected() {
        assert!(CliArgs::try_parse_from(["program"]).is_err());
    }

    #[rstest]
    #[case::seed_files(
        &["program", "--requests", "r.csv", "--events", "e.csv", "--wallets", "w.csv", "d.csv"],
        Some("r.csv"),
        Some("e.csv"),
        Some("w.csv")
    )]
    #[case::decisions_only(&["program", "d.csv"], None, None, None)]
    fn test_input_paths(
        #[case] args: &[&str],
        #[case] requests: Option<&str>,
        #[case] events: Option<&str>,
        #[case] wallets: Option<&str>,
    ) {
        let inputs = CliArgs::try_parse_from(args).unwrap().to_batch_inputs();
        assert_eq!(inputs.decisions, PathBuf::from("d.csv"));
        assert_eq!(inputs.requests, requests.map(PathBuf::from));
        assert_eq!(inputs.events, events.map(PathBuf::from));
        assert_eq!(inputs.wallets, wallets.map(PathBuf::from));
    }

    #[rstest]
    #[case::all_defaults(&["program", "d.csv"], "admin@gmail.com", None, num_cpus::get())]
    #[case::custom(
        &["program", "--admin-email", "ops@example.com", "--deadline-ms", "1500", "--max-concurrent", "8", "d.csv"],
        "ops@example.com",
        Some(Duration::from_millis(1500)),
        8
    )]
    #[case::zero_values_fall_back(
        &["program", "--deadline-ms", "0", "--max-concurrent", "0", "d.csv"],
        "admin@gmail.com",
        None,
        num_cpus::get()
    )]
    fn test_service_config_conversion(
        #[case] args: &[&str],
        #[case] admin: &str,
        #[case] deadline: Option<Duration>,
        #[case] max_concurrent: usize,
    ) {
        let config = CliArgs::try_parse_from(args)
            .unwrap()
            .to_service_config()
            .unwrap();

        assert_eq!(config.admin_account.as_str(), admin);
        assert_eq!(config.settlement_deadline, deadline);
        assert_eq!(config.max_concurrent, max_concurrent);
    }

    #[test]
    fn test_invalid_admin_email_is_config_error() {
        let parsed = CliArgs::try_parse_from(["program", "--admin-email", "nobody", "d.csv"]).unwrap();
        assert!(matches!(
            parsed.to_service_config(),
            Err(ConfigError::InvalidValue(_, _))
        ));
    }
}
