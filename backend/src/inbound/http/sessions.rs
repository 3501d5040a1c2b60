//! Tutoring session HTTP handlers.
//!
//! ```text
//! POST /api/v1/sessions
//! GET  /api/v1/sessions/mine?role=&status=
//! GET  /api/v1/sessions/{id}
//! PUT  /api/v1/sessions/{id}/confirm
//! PUT  /api/v1/sessions/{id}/complete
//! PUT  /api/v1/sessions/{id}/cancel
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::booking::{ParticipantRole, Session, SessionStatus};
use crate::domain::ports::{
    BookSessionRequest, CancelSessionRequest, GetSessionRequest, ListSessionsRequest,
    SessionActionRequest,
};
use crate::domain::{Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::Caller;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_optional_enum, parse_rfc3339_timestamp, parse_uuid,
};

/// Request payload for booking a session.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionBody {
    #[schema(format = "uuid")]
    pub tutor_id: String,
    pub subject: String,
    #[schema(format = "date-time")]
    pub start_at: String,
    #[schema(format = "date-time")]
    pub end_at: String,
    pub notes: Option<String>,
}

/// Optional payload for cancelling a session.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelSessionBody {
    pub reason: Option<String>,
}

/// Filters for listing the caller's sessions.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSessionsQuery {
    /// `tutor` or `learner`. Absent means both.
    pub role: Option<String>,
    /// `pending`, `confirmed`, `completed` or `cancelled`.
    pub status: Option<String>,
}

/// Session representation returned by every session endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub tutor_id: String,
    #[schema(format = "uuid")]
    pub learner_id: String,
    pub subject: String,
    pub notes: Option<String>,
    #[schema(format = "date-time")]
    pub start_at: String,
    #[schema(format = "date-time")]
    pub end_at: String,
    #[schema(example = "pending")]
    pub status: String,
    /// Absent for system cancellations and live sessions.
    #[schema(format = "uuid")]
    pub cancelled_by: Option<String>,
    pub cancellation_reason: Option<String>,
    #[schema(example = "success")]
    pub conference_status: String,
    pub event_id: Option<String>,
    pub html_link: Option<String>,
    pub join_link: Option<String>,
    pub review_pending: bool,
    #[schema(format = "date-time")]
    pub created_at: String,
    #[schema(format = "date-time")]
    pub updated_at: String,
}

impl From<Session> for SessionResponse {
    fn from(value: Session) -> Self {
        let cancellation = value.cancellation();
        let conference = value.conference();
        Self {
            id: value.id().to_string(),
            tutor_id: value.tutor_id().to_string(),
            learner_id: value.learner_id().to_string(),
            subject: value.subject().to_owned(),
            notes: value.notes().map(str::to_owned),
            start_at: value.start_at().to_rfc3339(),
            end_at: value.end_at().to_rfc3339(),
            status: value.status().as_str().to_owned(),
            cancelled_by: cancellation
                .and_then(|c| c.cancelled_by.as_ref())
                .map(ToString::to_string),
            cancellation_reason: cancellation
                .map(|c| c.reason.clone())
                .filter(|reason| !reason.is_empty()),
            conference_status: conference.status.as_str().to_owned(),
            event_id: conference.event_id.clone(),
            html_link: conference.html_link.clone(),
            join_link: conference.join_link.clone(),
            review_pending: value.review_pending(),
            created_at: value.created_at().to_rfc3339(),
            updated_at: value.updated_at().to_rfc3339(),
        }
    }
}

fn parse_create_session(
    payload: CreateSessionBody,
    requester: UserId,
) -> Result<BookSessionRequest, Error> {
    let tutor_id = parse_uuid(&payload.tutor_id, FieldName::new("tutorId"))?;
    Ok(BookSessionRequest {
        requester,
        tutor_id: UserId::from_uuid(tutor_id),
        subject: payload.subject,
        start_at: parse_rfc3339_timestamp(&payload.start_at, FieldName::new("startAt"))?,
        end_at: parse_rfc3339_timestamp(&payload.end_at, FieldName::new("endAt"))?,
        notes: payload.notes,
    })
}

fn session_id(path: &str) -> Result<uuid::Uuid, Error> {
    parse_uuid(path, FieldName::new("id"))
}

/// Book a session with a tutor on behalf of the signed-in learner.
///
/// # Examples
/// ```no_run
/// use actix_web::{HttpResponse, web};
/// use tutor_booking::inbound::http::ApiResult;
/// use tutor_booking::inbound::http::session::Caller;
/// use tutor_booking::inbound::http::sessions::{CreateSessionBody, create_session};
/// use tutor_booking::inbound::http::state::HttpState;
///
/// async fn call_handler(state: web::Data<HttpState>, caller: Caller) -> ApiResult<HttpResponse> {
///     let payload = web::Json(CreateSessionBody {
///         tutor_id: "3fa85f64-5717-4562-b3fc-2c963f66afa6".to_owned(),
///         subject: "Linear algebra".to_owned(),
///         start_at: "2026-02-01T09:00:00Z".to_owned(),
///         end_at: "2026-02-01T10:00:00Z".to_owned(),
///         notes: None,
///     });
///     create_session(state, caller, payload).await
/// }
/// ```
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    request_body = CreateSessionBody,
    responses(
        (status = 201, description = "Session booked", body = SessionResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Tutor not found", body = ErrorSchema),
        (status = 409, description = "Overlapping session", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["sessions"],
    operation_id = "createSession",
    security(("SessionCookie" = []))
)]
#[post("/sessions")]
pub async fn create_session(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<CreateSessionBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_create_session(payload.into_inner(), caller.into_inner())?;
    let session = state.bookings.book(request).await?;
    Ok(HttpResponse::Created().json(SessionResponse::from(session)))
}

/// List the caller's sessions, newest start first.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/mine",
    params(ListSessionsQuery),
    responses(
        (status = 200, description = "Sessions of the caller", body = [SessionResponse]),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["sessions"],
    operation_id = "listMySessions",
    security(("SessionCookie" = []))
)]
#[get("/sessions/mine")]
pub async fn list_my_sessions(
    state: web::Data<HttpState>,
    caller: Caller,
    query: web::Query<ListSessionsQuery>,
) -> ApiResult<web::Json<Vec<SessionResponse>>> {
    let role: Option<ParticipantRole> = parse_optional_enum(
        query.role.as_deref(),
        FieldName::new("role"),
        "tutor, learner",
    )?;
    let status: Option<SessionStatus> = parse_optional_enum(
        query.status.as_deref(),
        FieldName::new("status"),
        "pending, confirmed, completed, cancelled",
    )?;
    let sessions = state
        .bookings_query
        .list_sessions(ListSessionsRequest {
            user_id: caller.into_inner(),
            role,
            status,
        })
        .await?;
    Ok(web::Json(
        sessions.into_iter().map(SessionResponse::from).collect(),
    ))
}

/// Fetch one session. Only its participants can see it.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}",
    params(("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session", body = SessionResponse),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["sessions"],
    operation_id = "getSession",
    security(("SessionCookie" = []))
)]
#[get("/sessions/{id}")]
pub async fn get_session(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
) -> ApiResult<web::Json<SessionResponse>> {
    let session = state
        .bookings_query
        .get_session(GetSessionRequest {
            session_id: session_id(&path)?,
            viewer: caller.into_inner(),
        })
        .await?;
    Ok(web::Json(SessionResponse::from(session)))
}

/// Tutor accepts a pending session.
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{id}/confirm",
    params(("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session confirmed", body = SessionResponse),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 403, description = "Caller is not the tutor", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Session is not pending", body = ErrorSchema)
    ),
    tags = ["sessions"],
    operation_id = "confirmSession",
    security(("SessionCookie" = []))
)]
#[put("/sessions/{id}/confirm")]
pub async fn confirm_session(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
) -> ApiResult<web::Json<SessionResponse>> {
    let session = state
        .bookings
        .confirm(SessionActionRequest {
            session_id: session_id(&path)?,
            actor: caller.into_inner(),
        })
        .await?;
    Ok(web::Json(SessionResponse::from(session)))
}

/// Either participant marks a live session as held.
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{id}/complete",
    params(("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session completed", body = SessionResponse),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Session is not live", body = ErrorSchema)
    ),
    tags = ["sessions"],
    operation_id = "completeSession",
    security(("SessionCookie" = []))
)]
#[put("/sessions/{id}/complete")]
pub async fn complete_session(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
) -> ApiResult<web::Json<SessionResponse>> {
    let session = state
        .bookings
        .complete(SessionActionRequest {
            session_id: session_id(&path)?,
            actor: caller.into_inner(),
        })
        .await?;
    Ok(web::Json(SessionResponse::from(session)))
}

/// An absent or blank body carries no reason; anything else must be a valid
/// [`CancelSessionBody`].
fn cancel_reason(body: &[u8]) -> Result<Option<String>, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let parsed: CancelSessionBody = serde_json::from_slice(body)
        .map_err(|err| Error::invalid_request(format!("invalid JSON body: {err}")))?;
    Ok(parsed.reason)
}

/// Either participant cancels a live session. The body is optional.
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{id}/cancel",
    params(("id" = String, Path, description = "Session identifier")),
    request_body(content = Option<CancelSessionBody>, description = "Optional reason"),
    responses(
        (status = 200, description = "Session cancelled", body = SessionResponse),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Session is not live", body = ErrorSchema)
    ),
    tags = ["sessions"],
    operation_id = "cancelSession",
    security(("SessionCookie" = []))
)]
#[put("/sessions/{id}/cancel")]
pub async fn cancel_session(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<web::Json<SessionResponse>> {
    let session_id = session_id(&path)?;
    let reason = cancel_reason(&body)?;
    let session = state
        .bookings
        .cancel(CancelSessionRequest {
            session_id,
            actor: caller.into_inner(),
            reason,
        })
        .await?;
    Ok(web::Json(SessionResponse::from(session)))
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
