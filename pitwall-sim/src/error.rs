//! Error types surfaced by the race simulator.
use thiserror::Error;

/// Errors raised when a race configuration violates its documented bounds.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("total_laps must be positive (got {value})")]
    NonPositiveLaps { value: i64 },
    #[error("field_variability_s must be finite and non-negative (got {value})")]
    InvalidVariability { value: f64 },
    #[error("race config parse error: {0}")]
    Parse(String),
}

/// Errors returned by simulator operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("invalid action {0}: expected a value in 0..=5")]
    InvalidAction(i64),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}
