//! Error types for operator construction.

use cg_core::CoreError;
use thiserror::Error;

/// Result type for operator operations.
pub type NodeResult<T> = Result<T, NodeError>;

/// Errors raised while configuring an operator node.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NodeError {
    /// Invalid operator parameter.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Zero, negative or non-finite period.
    #[error("Invalid period: {period} s (must be positive and finite)")]
    InvalidPeriod { period: f64 },

    /// Non-finite parameter value.
    #[error("Non-finite value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}

impl From<CoreError> for NodeError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidPeriod { period } => NodeError::InvalidPeriod { period },
            CoreError::NonFinite { what, value } => NodeError::NonFinite { what, value },
            CoreError::InvalidArg { what } => NodeError::InvalidArg { what },
        }
    }
}
