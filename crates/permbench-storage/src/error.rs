//! Storage error types.

use std::fmt;

use permbench_domain::error::DomainError;
use permbench_domain::model::AclRow;
use thiserror::Error;

/// How a flattened row disagrees with the hierarchy it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnomalyKind {
    /// The row is stored but nothing in the graph grants it.
    Orphaned,
    /// The graph grants the pair but no row is stored.
    Missing,
}

/// A single flattened-ACL inconsistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsistencyAnomaly {
    pub row: AclRow,
    pub kind: AnomalyKind,
}

impl fmt::Display for ConsistencyAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AnomalyKind::Orphaned => write!(f, "orphaned row {}", self.row),
            AnomalyKind::Missing => write!(f, "missing row {}", self.row),
        }
    }
}

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Input rejected before anything was applied.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Stored rows disagree with the hierarchy; nothing was applied.
    #[error("consistency violation: {} anomalies (first: {})", .anomalies.len(), first_anomaly(.anomalies))]
    ConsistencyViolation { anomalies: Vec<ConsistencyAnomaly> },

    /// Backend connection error.
    #[error("storage connection error: {message}")]
    ConnectionError { message: String },

    /// Operation did not complete in time.
    #[error("storage timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Internal error.
    #[error("internal storage error: {message}")]
    InternalError { message: String },
}

fn first_anomaly(anomalies: &[ConsistencyAnomaly]) -> String {
    anomalies
        .first()
        .map_or_else(|| "none".to_string(), ToString::to_string)
}

impl StorageError {
    /// Returns true when retrying the operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionError { .. } | Self::Timeout { .. })
    }

    /// Returns true for input rejected at the boundary.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<DomainError> for StorageError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Timeout { duration_ms } => Self::Timeout { duration_ms },
            DomainError::Storage { message, transient } if transient => {
                Self::ConnectionError { message }
            }
            DomainError::Storage { message, .. } => Self::InternalError { message },
            other => Self::Validation {
                message: other.to_string(),
            },
        }
    }
}

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Timeout { duration_ms } => DomainError::Timeout { duration_ms },
            other => DomainError::Storage {
                transient: other.is_transient(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
