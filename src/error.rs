//! Error types for the projection model

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, validating or projecting an assumption set
#[derive(Debug, Error)]
pub enum ModelError {
    /// The assumption set cannot produce a meaningful projection
    #[error("invalid assumptions: {field}: {reason}")]
    InvalidAssumptions { field: &'static str, reason: String },

    /// IRR bisection ran out of iterations before reaching the NPV precision band
    #[error("IRR did not converge after {iterations} iterations (last NPV {npv:.6})")]
    NonConvergent { iterations: u32, npv: f64 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON assumptions: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Assumption sheet row names a field the model does not know
    #[error("unknown assumption field: {0}")]
    UnknownField(String),

    #[error("invalid value {value:?} for assumption field {field}")]
    InvalidValue { field: String, value: String },

    #[error("unsupported assumption file extension: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

impl ModelError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ModelError::InvalidAssumptions {
            field,
            reason: reason.into(),
        }
    }
}
