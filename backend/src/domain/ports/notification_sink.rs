//! Port for fire-and-forget user notifications.

use async_trait::async_trait;

use crate::domain::notification::Notification;

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification adapters.
    pub enum NotificationSinkError {
        /// The notification could not be stored or delivered.
        Delivery { message: String } => "notification delivery failed: {message}",
    }
}

/// Destination for notifications produced by booking transitions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationSinkError>;
}
