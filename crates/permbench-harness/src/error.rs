//! Harness error types.

use permbench_domain::error::DomainError;
use permbench_storage::StorageError;
use thiserror::Error;

/// Errors raised while generating, loading or benchmarking a corpus.
///
/// Failed checks and deadline expiry during a run are not errors: they are
/// counted in the report.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid corpus: {message}")]
    InvalidCorpus { message: String },

    #[error("load verification failed: {message}")]
    LoadVerification { message: String },
}

impl HarnessError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
