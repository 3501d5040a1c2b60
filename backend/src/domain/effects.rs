//! External side effects that follow a committed session write.
//!
//! Services commit core state first and then hand the follow-up work to an
//! [`EffectDispatcher`]. Every external call is bounded by a timeout and its
//! failure is logged, never propagated.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::Participant;
use crate::domain::booking::{Conference, ConferenceStatus, Session};
use crate::domain::notification::Notification;
use crate::domain::ports::{CalendarError, CalendarProvider, MeetingRequest, NotificationSink};

/// Default bound on each external call.
pub const DEFAULT_EXTERNAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Work to run after a session write has committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingEffect {
    Notify(Notification),
    DeleteMeeting { session_id: Uuid, event_id: String },
}

/// Counts of effects that ran or failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Meeting deletion follows any cancellation of a session that has one.
pub fn meeting_cleanup(session: &Session) -> Option<BookingEffect> {
    session
        .conference()
        .event_id
        .clone()
        .map(|event_id| BookingEffect::DeleteMeeting {
            session_id: session.id(),
            event_id,
        })
}

/// Runs best-effort calls against the calendar and notification collaborators.
#[derive(Clone)]
pub struct EffectDispatcher {
    calendar: Arc<dyn CalendarProvider>,
    notifications: Arc<dyn NotificationSink>,
    timeout: Duration,
}

impl EffectDispatcher {
    pub fn new(
        calendar: Arc<dyn CalendarProvider>,
        notifications: Arc<dyn NotificationSink>,
        timeout: Duration,
    ) -> Self {
        Self {
            calendar,
            notifications,
            timeout,
        }
    }

    async fn bounded<E, F>(&self, call: F) -> Result<(), String>
    where
        F: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(|error| error.to_string()),
            Err(_) => Err(format!("timed out after {:?}", self.timeout)),
        }
    }

    async fn delete_meeting(&self, event_id: &str) -> Result<(), String> {
        let call = async {
            match self.calendar.delete_event(event_id).await {
                Err(CalendarError::NotConfigured) => Ok(()),
                other => other,
            }
        };
        self.bounded(call).await
    }

    /// Ask the calendar provider for a meeting and translate the outcome.
    ///
    /// Without a configured provider the conference stays pending. A failure,
    /// a timeout, or an event without a join link degrades to `failure`.
    pub async fn create_meeting(
        &self,
        session: &Session,
        tutor: &Participant,
        learner: &Participant,
    ) -> Conference {
        let request = MeetingRequest {
            session_id: session.id(),
            summary: format!("Tutoring: {}", session.subject()),
            description: session.notes().map(str::to_owned),
            start_at: session.start_at(),
            end_at: session.end_at(),
            attendees: [tutor, learner]
                .iter()
                .filter_map(|participant| participant.email().map(str::to_owned))
                .collect(),
        };

        let outcome =
            tokio::time::timeout(self.timeout, self.calendar.create_event(&request)).await;
        match outcome {
            Ok(Ok(event)) => {
                let status = if event.join_link.is_some() {
                    ConferenceStatus::Success
                } else {
                    warn!(session_id = %session.id(), "calendar event created without a join link");
                    ConferenceStatus::Failure
                };
                Conference {
                    status,
                    event_id: Some(event.event_id),
                    html_link: event.html_link,
                    join_link: event.join_link,
                }
            }
            Ok(Err(CalendarError::NotConfigured)) => {
                debug!(session_id = %session.id(), "no calendar provider configured");
                Conference::pending()
            }
            Ok(Err(error)) => {
                warn!(session_id = %session.id(), %error, "meeting creation failed");
                Conference::failed()
            }
            Err(_) => {
                warn!(
                    session_id = %session.id(),
                    timeout = ?self.timeout,
                    "meeting creation timed out"
                );
                Conference::failed()
            }
        }
    }

    /// Run every effect in order. Failures are logged and counted.
    pub async fn dispatch(&self, effects: Vec<BookingEffect>) -> DispatchReport {
        let mut report = DispatchReport::default();
        for effect in effects {
            let outcome = match &effect {
                BookingEffect::Notify(notification) => {
                    self.bounded(self.notifications.notify(notification)).await
                }
                BookingEffect::DeleteMeeting { event_id, .. } => {
                    self.delete_meeting(event_id).await
                }
            };
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(message) => {
                    report.failed += 1;
                    match effect {
                        BookingEffect::Notify(notification) => warn!(
                            session_id = %notification.session_id,
                            user_id = %notification.user_id,
                            kind = %notification.kind,
                            error = %message,
                            "notification delivery failed"
                        ),
                        BookingEffect::DeleteMeeting {
                            session_id,
                            event_id,
                        } => warn!(
                            %session_id,
                            %event_id,
                            error = %message,
                            "meeting deletion failed"
                        ),
                    }
                }
            }
        }
        report
    }
}
