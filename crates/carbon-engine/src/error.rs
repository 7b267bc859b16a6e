//! Error types for the estimation engine

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load an emission factor resource.
///
/// Callers that must never block a report use
/// [`FactorTable::load_or_default`](crate::factors::FactorTable::load_or_default),
/// which logs these and falls back to the built-in table.
#[derive(Debug, Error)]
pub enum FactorError {
    #[error("failed to read factor data {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse factor data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid {field} for '{key}': {value} (must be finite and >= 0)")]
    Invalid {
        key: String,
        field: &'static str,
        value: f64,
    },
}

/// Failure while computing emissions from a transaction distribution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("{quantity} for network '{network}' is not a finite number")]
    NonFinite {
        network: String,
        quantity: &'static str,
    },

    #[error("transaction type multiplier is not a finite number")]
    NonFiniteMultiplier,
}
