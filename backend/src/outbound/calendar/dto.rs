//! Wire types for the calendar events API.

use serde::{Deserialize, Serialize};

use crate::domain::ports::{CalendarEvent, MeetingRequest};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EventInsertDto<'a> {
    pub(super) summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) description: Option<&'a str>,
    pub(super) start: EventTimeDto,
    pub(super) end: EventTimeDto,
    pub(super) attendees: Vec<AttendeeDto<'a>>,
    pub(super) conference_data: ConferenceDataDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EventTimeDto {
    pub(super) date_time: String,
    pub(super) time_zone: &'static str,
}

#[derive(Debug, Serialize)]
pub(super) struct AttendeeDto<'a> {
    pub(super) email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ConferenceDataDto {
    pub(super) create_request: CreateConferenceDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateConferenceDto {
    /// Idempotency key; the session id keeps retries from creating twins.
    pub(super) request_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EventResponseDto {
    pub(super) id: String,
    pub(super) html_link: Option<String>,
    pub(super) hangout_link: Option<String>,
}

impl<'a> EventInsertDto<'a> {
    pub(super) fn from_request(request: &'a MeetingRequest) -> Self {
        Self {
            summary: &request.summary,
            description: request.description.as_deref(),
            start: EventTimeDto {
                date_time: request.start_at.to_rfc3339(),
                time_zone: "UTC",
            },
            end: EventTimeDto {
                date_time: request.end_at.to_rfc3339(),
                time_zone: "UTC",
            },
            attendees: request
                .attendees
                .iter()
                .map(|email| AttendeeDto { email })
                .collect(),
            conference_data: ConferenceDataDto {
                create_request: CreateConferenceDto {
                    request_id: request.session_id.to_string(),
                },
            },
        }
    }
}

impl EventResponseDto {
    pub(super) fn into_event(self) -> Result<CalendarEvent, String> {
        if self.id.trim().is_empty() {
            return Err("event id is empty".to_owned());
        }
        Ok(CalendarEvent {
            event_id: self.id,
            html_link: self.html_link,
            join_link: self.hangout_link,
        })
    }
}
