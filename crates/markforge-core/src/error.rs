//! Error types for MarkForge

use thiserror::Error;

use crate::mark::MarkId;

/// Failure reported by an energy evaluator.
///
/// Raised when a mark, a pair or a whole configuration cannot be scored
/// (malformed geometry, a region outside the image, ...).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct EvaluationError {
    message: String,
    mark: Option<MarkId>,
}

impl EvaluationError {
    /// Creates an evaluation error that is not tied to a specific mark.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            mark: None,
        }
    }

    /// Creates an evaluation error caused by the given mark.
    pub fn for_mark(mark: MarkId, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            mark: Some(mark),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The mark that could not be scored, if known.
    pub fn mark(&self) -> Option<MarkId> {
        self.mark
    }
}

/// Main error type for MarkForge operations
#[derive(Debug, Error)]
pub enum MarkForgeError {
    /// A mark with this identity is already part of the configuration
    #[error("Duplicate mark identity: {0}")]
    DuplicateIdentity(MarkId),

    /// A position does not address a mark of the configuration
    #[error("Index {index} out of range for configuration of {len} marks")]
    IndexOutOfRange { index: usize, len: usize },

    /// A two-mark operation was given the same position twice
    #[error("Both indices address the same mark: {0}")]
    IdenticalIndices(usize),

    /// The mark is not part of the configuration
    #[error("Mark not found: {0}")]
    NotFound(MarkId),

    /// The injected evaluator failed; the mutation was not committed
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// The kernel proposer could not be constructed
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Incrementally maintained energy drifted from its components
    #[error("Energy invariant violated: {0}")]
    InvariantViolation(String),

    /// Internal error (should not occur in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MarkForgeError {
    /// Returns true for errors caused by invalid indices or marks.
    ///
    /// Structural errors always leave the configuration unchanged.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            MarkForgeError::DuplicateIdentity(_)
                | MarkForgeError::IndexOutOfRange { .. }
                | MarkForgeError::IdenticalIndices(_)
                | MarkForgeError::NotFound(_)
        )
    }
}

/// Result type alias for MarkForge operations
pub type Result<T> = std::result::Result<T, MarkForgeError>;
