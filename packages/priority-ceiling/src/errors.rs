//! Error types for priority-ceiling
//!
//! Verification diagnostics are not errors of the library itself: they are
//! carried by [`VerificationFailure`] and surface here only through the
//! convenience entry points that also parse input.

use crate::config::ConfigError;
use crate::pipeline::VerificationFailure;
use thiserror::Error;

/// Main error type for priority-ceiling operations
#[derive(Debug, Error)]
pub enum CeilingError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Front-end handoff could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Program rejected by the analysis
    #[error(transparent)]
    Verification(#[from] VerificationFailure),
}

impl CeilingError {
    /// Diagnostics of a rejected program
    pub fn diagnostics(&self) -> Option<&crate::shared::models::Diagnostics> {
        match self {
            Self::Verification(failure) => Some(&failure.diagnostics),
            _ => None,
        }
    }
}

/// Result type alias for priority-ceiling operations
pub type Result<T> = std::result::Result<T, CeilingError>;
