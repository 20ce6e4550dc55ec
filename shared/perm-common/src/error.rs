//! Common Errors

use thiserror::Error;

/// Errors raised while constructing or parsing shared identity types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Subject type was empty.
    #[error("Subject type must not be empty")]
    EmptySubjectType,

    /// Subject identifier was empty.
    #[error("Subject identifier must not be empty (type: {0})")]
    EmptyIdentifier(String),

    /// Text could not be parsed as `type:identifier`.
    #[error("Malformed subject reference: {0}")]
    MalformedSubject(String),

    /// Context key was empty.
    #[error("Context key must not be empty")]
    EmptyContextKey,

    /// Text could not be parsed as `key=value`.
    #[error("Malformed context value: {0}")]
    MalformedContext(String),
}

/// Result alias for common operations.
pub type Result<T> = std::result::Result<T, Error>;
