//! Service configuration
//!
//! [`ServiceConfig`] collects the knobs shared by the gateway and the batch
//! driver. It is built once at start-up (from CLI arguments or directly in
//! tests) and then handed to the components by value.

use crate::types::{AdminAccountId, ConfigError};
use clap::ValueEnum;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::warn;

/// What to do when the admin wallet cannot cover a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OverdraftPolicy {
    /// Refuse the settlement with `FailedPrecondition`
    #[default]
    Reject,
    /// Let the admin balance go negative
    Allow,
}

impl OverdraftPolicy {
    /// Lowest admin balance a debit may leave behind
    pub fn floor(self) -> Option<Decimal> {
        match self {
            OverdraftPolicy::Reject => Some(Decimal::ZERO),
            OverdraftPolicy::Allow => None,
        }
    }
}

/// Validated service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Identity of the single admin wallet
    pub admin_account: AdminAccountId,
    pub overdraft: OverdraftPolicy,
    /// Per-call deadline applied to every settlement; `None` means unbounded
    pub settlement_deadline: Option<Duration>,
    /// Maximum number of settlements driven concurrently by the batch driver
    pub max_concurrent: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            admin_account: AdminAccountId::default(),
            overdraft: OverdraftPolicy::default(),
            settlement_deadline: None,
            max_concurrent: num_cpus::get(),
        }
    }
}

impl ServiceConfig {
    /// Build a configuration, substituting defaults for zero values
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the admin email is blank or
    /// does not look like an email address.
    pub fn new(
        admin_email: &str,
        overdraft: OverdraftPolicy,
        deadline_ms: Option<u64>,
        max_concurrent: usize,
    ) -> Result<Self, ConfigError> {
        let default = Self::default();

        let admin_email = admin_email.trim();
        if admin_email.is_empty() {
            return Err(ConfigError::Missing("admin email".to_string()));
        }
        if !admin_email.contains('@') {
            return Err(ConfigError::InvalidValue(
                "admin email".to_string(),
                admin_email.to_string(),
            ));
        }

        let settlement_deadline = match deadline_ms {
            Some(0) => {
                warn!(
                    deadline_ms = 0,
                    "Invalid settlement deadline, settlements will run without a deadline"
                );
                None
            }
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        };

        let max_concurrent = if max_concurrent == 0 {
            warn!(
                max_concurrent,
                default = default.max_concurrent,
                "Invalid max_concurrent, using default"
            );
            default.max_concurrent
        } else {
            max_concurrent
        };

        Ok(Self {
            admin_account: AdminAccountId::new(admin_email),
            overdraft,
            settlement_deadline,
            max_concurrent,
        })
    }
}
