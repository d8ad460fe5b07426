//! Error types for admission operations.

use thiserror::Error;

/// Errors produced by admission components.
///
/// Every variant except [`AdmissionError::Conflict`] and
/// [`AdmissionError::Backend`] is a domain condition: expected, recoverable,
/// and never retried by the core itself. `Conflict` is a retryable storage
/// serialization failure; the controller retries it a bounded number of times
/// before surfacing it.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// Resource deadline elapsed before the request was submitted.
    #[error("submission deadline has passed")]
    DeadlinePassed,
    /// An allocation already exists for this (requester, resource) pair.
    #[error("requester already holds an allocation for this resource")]
    DuplicateAllocation,
    /// A pending or waitlisted request already exists for this pair.
    #[error("requester already has an active request for this resource")]
    DuplicateActiveRequest,
    /// Resource is at capacity; the request keeps its current status.
    #[error("resource is full")]
    ResourceFull,
    /// Request is already approved or rejected.
    #[error("request is already in a terminal state")]
    AlreadyTerminal,
    /// Reviewer is not authorized to act on this resource.
    #[error("reviewer is not authorized for this resource")]
    NotAuthorized,
    /// Request, resource, or allocation does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Retryable storage conflict (e.g. serialization failure).
    #[error("storage conflict: {0}")]
    Conflict(String),
    /// Backend-specific failure with context. Not retried.
    #[error("backend error: {0}")]
    Backend(String),
}

impl AdmissionError {
    /// Whether the controller may transparently retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
