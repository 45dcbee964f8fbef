//! UseCase errors.

use thiserror::Error;

use crate::domain::RepositoryError;

/// Errors raised while replaying a room's history.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomHistoryError {
    #[error("Failed to read history: {0}")]
    Repository(#[from] RepositoryError),
}
