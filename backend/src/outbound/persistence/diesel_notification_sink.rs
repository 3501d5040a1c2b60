//! Notification sink that stores each notification as a row.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::notification::Notification;
use crate::domain::ports::{NotificationSink, NotificationSinkError};

use super::models::NewNotificationRow;
use super::pool::DbPool;
use super::schema::notifications;

/// Diesel-backed notification sink; clients read the `notifications` table.
#[derive(Clone)]
pub struct DieselNotificationSink {
    pool: DbPool,
}

impl DieselNotificationSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for DieselNotificationSink {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationSinkError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| NotificationSinkError::delivery(err.to_string()))?;
        let row = NewNotificationRow {
            id: Uuid::new_v4(),
            user_id: *notification.user_id.as_uuid(),
            kind: notification.kind.as_str(),
            title: &notification.title,
            message: &notification.message,
            session_id: Some(notification.session_id),
        };
        diesel::insert_into(notifications::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|err| NotificationSinkError::delivery(err.to_string()))?;
        Ok(())
    }
}
