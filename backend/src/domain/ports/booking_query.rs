//! Driving port for session reads.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::booking::{ParticipantRole, Session, SessionStatus};
use crate::domain::{Error, UserId};

/// Request for one session, visible only to its participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSessionRequest {
    pub session_id: Uuid,
    pub viewer: UserId,
}

/// Request for the caller's sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSessionsRequest {
    pub user_id: UserId,
    pub role: Option<ParticipantRole>,
    pub status: Option<SessionStatus>,
}

/// Driving port for session queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingQuery: Send + Sync {
    /// Fetch one session. Non-participants get `not_found`.
    async fn get_session(&self, request: GetSessionRequest) -> Result<Session, Error>;

    /// List sessions of the caller, newest start first.
    async fn list_sessions(&self, request: ListSessionsRequest) -> Result<Vec<Session>, Error>;
}
