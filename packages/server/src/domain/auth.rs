//! Authentication collaborator.

use super::{AuthError, UserId};

/// Turns the credential presented at connection time into a user identifier.
///
/// Called exactly once per connection, before it is registered with the Hub.
#[cfg_attr(test, mockall::automock)]
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, credential: &str) -> Result<UserId, AuthError>;
}
