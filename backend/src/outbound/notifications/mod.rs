//! Notification sink that writes each notification to the structured log.
//!
//! Used when no database is configured, so booking effects stay observable.

use async_trait::async_trait;
use tracing::info;

use crate::domain::notification::Notification;
use crate::domain::ports::{NotificationSink, NotificationSinkError};

/// Emits one `info` event per notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationSinkError> {
        info!(
            user_id = %notification.user_id,
            kind = notification.kind.as_str(),
            session_id = %notification.session_id,
            title = %notification.title,
            "notification delivered"
        );
        Ok(())
    }
}
