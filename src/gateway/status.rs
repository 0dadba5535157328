//! Caller-visible error status
//!
//! Every gateway operation fails with a [`Status`]: an [`ErrorKind`] code plus
//! a human-readable message. Errors from the orchestrator and the stores keep
//! their kind unchanged on the way out.

use crate::types::{ConfigError, ErrorKind, SettlementError, StoreError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct Status {
    pub code: ErrorKind,
    pub message: String,
}

impl Status {
    pub fn new(code: ErrorKind, message: impl Into<String>) -> Self {
        Status {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Status::new(ErrorKind::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Status::new(ErrorKind::NotFound, message)
    }
}

impl From<SettlementError> for Status {
    fn from(err: SettlementError) -> Self {
        Status::new(err.kind(), err.to_string())
    }
}

impl From<StoreError> for Status {
    fn from(err: StoreError) -> Self {
        Status::new(err.kind(), err.to_string())
    }
}

impl From<ConfigError> for Status {
    fn from(err: ConfigError) -> Self {
        Status::invalid_argument(err.to_string())
    }
}
