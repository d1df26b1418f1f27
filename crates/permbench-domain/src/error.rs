//! Domain error types for authorization operations.

use thiserror::Error;

/// Domain-specific errors for authorization operations.
///
/// A denied permission is never an error; `check` reports it as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Invalid object format.
    #[error("invalid object format: {value}")]
    InvalidObjectFormat { value: String },

    /// Invalid subject format.
    #[error("invalid subject format: {value}")]
    InvalidSubjectFormat { value: String },

    /// Invalid relation format.
    #[error("invalid relation format: {value}")]
    InvalidRelationFormat { value: String },

    /// Relation not defined on type.
    #[error("relation '{relation}' not found on type '{type_name}'")]
    RelationNotFound { type_name: String, relation: String },

    /// Subject kind not accepted by the relation.
    #[error("subject '{subject}' is not allowed on {object_type}#{relation}")]
    SubjectNotAllowed {
        object_type: String,
        relation: String,
        subject: String,
    },

    /// Entity referenced by an operation does not exist.
    #[error("{kind} not found: {id}")]
    EntityNotFound { kind: &'static str, id: u64 },

    /// Entity already exists.
    #[error("{kind} already exists: {id}")]
    EntityAlreadyExists { kind: &'static str, id: u64 },

    /// Department hierarchy invariant violated (cycle or depth bound).
    #[error("invalid department hierarchy: {message}")]
    InvalidHierarchy { message: String },

    /// Tuple reader failure surfaced through the resolver.
    #[error("storage error: {message}")]
    Storage { message: String, transient: bool },

    /// Timeout during permission check.
    #[error("timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

impl DomainError {
    /// Returns true for errors caused by malformed input rather than by the
    /// state of the store or the environment.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Storage { .. } | Self::Timeout { .. })
    }

    /// Returns true when retrying the operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage { transient, .. } => *transient,
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
