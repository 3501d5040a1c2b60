//! Port for the external calendar and video-conferencing provider.
//!
//! Every call is fallible and treated as best-effort by the domain.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::define_port_error;

define_port_error! {
    /// Errors raised by calendar adapters.
    pub enum CalendarError {
        /// No provider is configured for this deployment.
        NotConfigured => "no calendar provider is configured",
        /// The request could not be delivered.
        Transport { message: String } => "calendar transport failed: {message}",
        /// The provider refused the request.
        Rejected { status: u16, message: String } =>
            "calendar provider rejected the request with status {status}: {message}",
        /// The provider answered with an unreadable payload.
        Decode { message: String } => "calendar response could not be decoded: {message}",
        /// The call did not finish within the configured timeout.
        Timeout => "calendar call timed out",
    }
}

/// Details of the meeting to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRequest {
    pub session_id: Uuid,
    pub summary: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub attendees: Vec<String>,
}

/// Event created by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub event_id: String,
    pub html_link: Option<String>,
    pub join_link: Option<String>,
}

/// Port for creating and deleting meetings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Create a meeting for a booked session.
    async fn create_event(&self, request: &MeetingRequest) -> Result<CalendarEvent, CalendarError>;

    /// Delete a previously created meeting.
    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError>;
}

/// Provider used when no calendar endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCalendarProvider;

#[async_trait]
impl CalendarProvider for FixtureCalendarProvider {
    async fn create_event(
        &self,
        _request: &MeetingRequest,
    ) -> Result<CalendarEvent, CalendarError> {
        Err(CalendarError::not_configured())
    }

    async fn delete_event(&self, _event_id: &str) -> Result<(), CalendarError> {
        Err(CalendarError::not_configured())
    }
}
