//! Port for looking up participants owned by the identity service.

use async_trait::async_trait;

use crate::domain::{Participant, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user directory adapters.
    pub enum UserDirectoryError {
        /// Directory connection could not be established.
        Connection { message: String } =>
            "user directory connection failed: {message}",
        /// Lookup failed during execution.
        Query { message: String } =>
            "user directory query failed: {message}",
    }
}

/// Read-only access to user identity and the tutor flag.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by id.
    async fn find_user(&self, user_id: &UserId) -> Result<Option<Participant>, UserDirectoryError>;
}
