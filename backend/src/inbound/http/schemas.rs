//! OpenAPI schemas for the domain error payload.
//!
//! `crate::domain::Error` stays free of utoipa derives; these mirrors are
//! registered under the domain type names instead.

use utoipa::ToSchema;

/// Error codes a booking client can branch on.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// Malformed body, bad timestamp, inverted window or blank subject.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// No signed-in caller.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// A learner tried a tutor-only action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// Unknown session, slot or tutor, or a session the caller is not part of.
    #[schema(rename = "not_found")]
    NotFound,
    /// Overlapping booking or slot, or a transition from the wrong status.
    #[schema(rename = "conflict")]
    Conflict,
    /// The session store is unreachable. Retry later.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// Unexpected failure; the message is redacted.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// Error body returned by every endpoint.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    #[schema(example = "conflict")]
    code: ErrorCodeSchema,
    #[schema(example = "tutor already has a session in this time range")]
    message: String,
    /// Echo of the `trace-id` response header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Field-level context, e.g. `{"field": "startAt"}`.
    details: Option<serde_json::Value>,
}
