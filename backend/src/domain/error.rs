//! Error type returned by every booking operation.
//!
//! Transport agnostic: the HTTP adapter picks status codes and redaction.
//! Errors built while a [`TraceId`] is in scope carry it, so a client can
//! quote the id from the body and an operator can find the matching logs.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::TraceId;

/// Failure category a client can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed or semantically invalid input.
    InvalidRequest,
    /// No authenticated caller.
    Unauthorized,
    /// The caller's role does not allow the action.
    Forbidden,
    /// Unknown entity, or one the caller may not see.
    NotFound,
    /// Overlap, lost race or illegal status transition.
    Conflict,
    /// A backing store is unreachable.
    ServiceUnavailable,
    /// Anything else.
    InternalError,
}

impl ErrorCode {
    /// Message used when a constructor receives a blank one.
    fn fallback_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid request",
            Self::Unauthorized => "login required",
            Self::Forbidden => "action not permitted",
            Self::NotFound => "not found",
            Self::Conflict => "request conflicts with the current booking state",
            Self::ServiceUnavailable => "service temporarily unavailable",
            Self::InternalError => "Internal server error",
        }
    }
}

/// Reasons an encoded error payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    #[error("error message must not be empty")]
    EmptyMessage,
    #[error("trace identifier must be a UUID")]
    InvalidTraceId,
}

/// Domain error payload.
///
/// `message` is never blank.
///
/// # Examples
/// ```
/// use tutor_booking::domain::{Error, ErrorCode};
///
/// let err = Error::conflict("session is already cancelled");
/// assert_eq!(err.code(), ErrorCode::Conflict);
///
/// let blank = Error::not_found("  ");
/// assert_eq!(blank.message(), "not found");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    trace_id: Option<TraceId>,
    details: Option<Value>,
}

impl Error {
    /// Build an error, capturing the ambient trace id.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            code.fallback_message().to_owned()
        } else {
            message
        };
        Self {
            code,
            message,
            trace_id: TraceId::current(),
            details: None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace_id(&self) -> Option<TraceId> {
        self.trace_id
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details.
    ///
    /// ```
    /// use serde_json::json;
    /// use tutor_booking::domain::Error;
    ///
    /// let err = Error::invalid_request("bad").with_details(json!({ "field": "startAt" }));
    /// assert!(err.details().is_some());
    /// ```
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Point the client at the offending request field.
    pub fn for_field(self, field: &str) -> Self {
        self.with_details(json!({ "field": field }))
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            trace_id: value.trace_id.map(|id| id.to_string()),
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        if value.message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        // Decoded payloads keep their own correlation, never the ambient one.
        let trace_id = value
            .trace_id
            .map(|raw| raw.parse().map_err(|_| ErrorValidationError::InvalidTraceId))
            .transpose()?;
        Ok(Self {
            code: value.code,
            message: value.message,
            trace_id,
            details: value.details,
        })
    }
}
