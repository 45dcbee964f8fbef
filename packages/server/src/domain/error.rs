//! Domain errors.

use thiserror::Error;

/// Validation errors raised when constructing value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("User ID must not be empty")]
    UserIdEmpty,

    #[error("User ID '{0}' must not contain '{1}'")]
    UserIdContainsSeparator(String, char),

    #[error("User ID '{0}' is reserved")]
    UserIdReserved(String),

    #[error("Group ID must not be empty")]
    GroupIdEmpty,

    #[error("Room key must not be empty")]
    RoomKeyEmpty,

    #[error("Message body must not be empty")]
    MessageBodyEmpty,
}

/// Errors raised by the message log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Message log unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while authenticating a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing credential")]
    MissingCredential,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid subject: {0}")]
    InvalidSubject(#[from] ValueObjectError),
}
