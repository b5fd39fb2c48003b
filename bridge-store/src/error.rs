//! Error types for the data store.

use thiserror::Error;

/// Errors emitted by [`crate::DataStore`] mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced user does not exist.
    #[error("User {0} not found")]
    UnknownUser(i64),
    /// Task identifiers were exhausted.
    #[error("task id space exhausted")]
    IdExhausted,
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
