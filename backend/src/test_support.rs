//! Test utilities for the backend crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled when running tests.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::notification::Notification;
use crate::domain::ports::{
    CalendarError, CalendarEvent, CalendarProvider, MeetingRequest, NotificationSink,
    NotificationSinkError,
};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{name} mutex poisoned"),
    }
}

/// Clock whose current instant only moves when a test advances it.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *lock(&self.0, "clock") += delta;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.0, "clock") = now;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0, "clock")
    }
}

/// Notification sink that keeps every delivered notification.
#[derive(Default)]
pub struct RecordingNotificationSink(Mutex<Vec<Notification>>);

impl RecordingNotificationSink {
    /// Notifications delivered so far, in delivery order.
    pub fn sent(&self) -> Vec<Notification> {
        lock(&self.0, "notification sink").clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationSinkError> {
        lock(&self.0, "notification sink").push(notification.clone());
        Ok(())
    }
}

/// Calendar provider that answers every request with a canned meeting and
/// remembers deletions.
#[derive(Default)]
pub struct RecordingCalendarProvider {
    created: Mutex<Vec<MeetingRequest>>,
    deleted: Mutex<Vec<String>>,
}

impl RecordingCalendarProvider {
    pub fn created(&self) -> Vec<MeetingRequest> {
        lock(&self.created, "calendar").clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        lock(&self.deleted, "calendar").clone()
    }
}

#[async_trait]
impl CalendarProvider for RecordingCalendarProvider {
    async fn create_event(&self, request: &MeetingRequest) -> Result<CalendarEvent, CalendarError> {
        lock(&self.created, "calendar").push(request.clone());
        let event_id = format!("evt-{}", request.session_id);
        Ok(CalendarEvent {
            html_link: Some(format!("https://calendar.test/{event_id}")),
            join_link: Some(format!("https://meet.test/{event_id}")),
            event_id,
        })
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        lock(&self.deleted, "calendar").push(event_id.to_owned());
        Ok(())
    }
}
