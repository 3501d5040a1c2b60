//! Reqwest-backed calendar provider.
//!
//! Owns transport details only: request serialisation, timeout and HTTP
//! error mapping, and JSON decoding into `CalendarEvent`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::{EventInsertDto, EventResponseDto};
use crate::domain::ports::{CalendarError, CalendarEvent, CalendarProvider, MeetingRequest};

const USER_AGENT: &str = "tutor-booking-calendar/0.1";

/// Calendar provider that talks JSON over HTTPS to one events endpoint.
pub struct HttpCalendarProvider {
    client: Client,
    events_url: String,
    bearer_token: Option<String>,
}

impl HttpCalendarProvider {
    /// Build an adapter whose requests time out after `timeout`.
    ///
    /// `endpoint` is the calendar collection; events live under
    /// `{endpoint}/events`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        timeout: Duration,
        bearer_token: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            events_url: format!("{}/events", endpoint.as_str().trim_end_matches('/')),
            bearer_token,
        })
    }

    fn authorised(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl CalendarProvider for HttpCalendarProvider {
    async fn create_event(&self, request: &MeetingRequest) -> Result<CalendarEvent, CalendarError> {
        let body = EventInsertDto::from_request(request);
        let response = self
            .authorised(self.client.post(&self.events_url))
            .query(&[("conferenceDataVersion", "1")])
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        parse_event(bytes.as_ref())
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        let url = format!("{}/{event_id}", self.events_url);
        let response = self
            .authorised(self.client.delete(url))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        // Already gone counts as deleted.
        if status.is_success() || status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Ok(());
        }
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        Err(map_status_error(status, bytes.as_ref()))
    }
}

fn parse_event(body: &[u8]) -> Result<CalendarEvent, CalendarError> {
    let decoded: EventResponseDto = serde_json::from_slice(body)
        .map_err(|error| CalendarError::decode(format!("invalid event payload: {error}")))?;
    decoded.into_event().map_err(CalendarError::decode)
}

fn map_transport_error(error: reqwest::Error) -> CalendarError {
    if error.is_timeout() {
        CalendarError::timeout()
    } else {
        CalendarError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> CalendarError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => CalendarError::timeout(),
        _ => CalendarError::rejected(status.as_u16(), body_preview(body)),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
        format!("{preview}...")
    } else {
        compact
    }
}
