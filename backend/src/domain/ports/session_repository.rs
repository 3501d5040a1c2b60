//! Port for session persistence.
//!
//! Adapters must make two writes atomic with respect to concurrent callers:
//! [`SessionRepository::insert_if_free`] re-checks the tutor's calendar and
//! inserts in one step, and [`SessionRepository::apply_transition`] only
//! writes when the stored status still matches the expected one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::booking::{Conference, ParticipantRole, Session, SessionStatus};

use super::define_port_error;

define_port_error! {
    /// Errors raised by session repository adapters.
    pub enum SessionRepositoryError {
        /// The tutor already has a live session overlapping the window.
        Overlap => "tutor already has a live session overlapping this window",
        /// The stored status no longer matches the one the caller read.
        StaleStatus { current: SessionStatus } =>
            "session status changed concurrently (now {current})",
        /// No session with the requested id exists.
        NotFound => "session not found",
        /// Repository connection could not be established.
        Connection { message: String } =>
            "session repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "session repository query failed: {message}",
    }
}

/// Port for reading and writing sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a new session unless a live session of the same tutor overlaps
    /// it. Returns [`SessionRepositoryError::Overlap`] when it does.
    async fn insert_if_free(&self, session: &Session) -> Result<(), SessionRepositoryError>;

    /// Find a session by id.
    async fn find_by_id(&self, session_id: &Uuid)
    -> Result<Option<Session>, SessionRepositoryError>;

    /// Live sessions of `tutor_id` that intersect `[from, to)`.
    async fn list_live_for_tutor(
        &self,
        tutor_id: &UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Session>, SessionRepositoryError>;

    /// Sessions where `user_id` takes part, newest start first.
    ///
    /// `role` narrows to one side of the booking; `status` to one state.
    async fn list_for_participant(
        &self,
        user_id: &UserId,
        role: Option<ParticipantRole>,
        status: Option<SessionStatus>,
    ) -> Result<Vec<Session>, SessionRepositoryError>;

    /// Pending sessions whose end is strictly before `now`.
    async fn list_pending_ended_before(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Session>, SessionRepositoryError>;

    /// Persist a transitioned session if its stored status equals `expected`.
    ///
    /// Returns the stored session. Its meeting fields come from the store,
    /// so a meeting recorded after `session` was loaded is not lost.
    async fn apply_transition(
        &self,
        session: &Session,
        expected: SessionStatus,
    ) -> Result<Session, SessionRepositoryError>;

    /// Record the meeting outcome for a live session without touching its
    /// status. Returns `false`, writing nothing, once the session has left
    /// the live statuses.
    async fn record_conference(
        &self,
        session_id: &Uuid,
        conference: &Conference,
    ) -> Result<bool, SessionRepositoryError>;
}
