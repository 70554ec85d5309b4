//! Error taxonomy for memory audits

use std::path::PathBuf;

/// Errors raised while loading inputs or running an analysis.
///
/// `NotFound` and `Malformed` are fatal and surface before any analysis starts.
/// `AnalysisUnavailable` only ever escapes an embedder; the redundancy analyzer
/// absorbs it into an empty result.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("input not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("malformed data in {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("semantic analysis unavailable: {reason}")]
    AnalysisUnavailable { reason: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;

impl AuditError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AuditError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        AuditError::AnalysisUnavailable {
            reason: reason.into(),
        }
    }
}
