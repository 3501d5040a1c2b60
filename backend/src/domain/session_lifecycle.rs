//! Guarded session writes shared by the booking service and the sweeper.
//!
//! A transition is computed on the loaded copy and persisted with a status
//! compare-and-set, so of two racing transitions only one is stored.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::booking::{Session, TransitionError};
use crate::domain::ports::{SessionRepository, SessionRepositoryError};

pub(crate) fn map_session_repository_error(error: SessionRepositoryError) -> Error {
    match error {
        SessionRepositoryError::Overlap => {
            Error::conflict("tutor already has a session overlapping this time")
        }
        SessionRepositoryError::StaleStatus { current } => {
            Error::conflict(format!("session is already {current}"))
        }
        SessionRepositoryError::NotFound => Error::not_found("session not found"),
        SessionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("session repository unavailable: {message}"))
        }
        SessionRepositoryError::Query { message } => {
            Error::internal(format!("session repository error: {message}"))
        }
    }
}

pub(crate) fn map_transition_error(error: TransitionError, session_id: Uuid) -> Error {
    match error {
        TransitionError::NotParticipant => {
            Error::not_found(format!("session {session_id} not found"))
        }
        TransitionError::NotTutor => Error::forbidden(error.to_string()),
        TransitionError::IllegalState { .. } => Error::conflict(error.to_string()),
    }
}

/// Why a guarded write did not happen.
#[derive(Debug)]
pub(crate) enum CommitError {
    /// The domain guard refused the transition.
    Rejected(TransitionError),
    /// The store refused or failed the write.
    Store(SessionRepositoryError),
}

impl CommitError {
    pub(crate) fn into_error(self, session_id: Uuid) -> Error {
        match self {
            Self::Rejected(error) => map_transition_error(error, session_id),
            Self::Store(error) => map_session_repository_error(error),
        }
    }
}

pub(crate) struct SessionLifecycle<S> {
    sessions: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for SessionLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S> SessionLifecycle<S>
where
    S: SessionRepository,
{
    pub(crate) fn new(sessions: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { sessions, clock }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Load a session or fail with `not_found`.
    pub(crate) async fn load(&self, session_id: Uuid) -> Result<Session, Error> {
        self.sessions
            .find_by_id(&session_id)
            .await
            .map_err(map_session_repository_error)?
            .ok_or_else(|| Error::not_found(format!("session {session_id} not found")))
    }

    /// Apply `transition` to `current` and store it if nobody moved the
    /// session out of its loaded status in the meantime.
    pub(crate) async fn commit<F>(
        &self,
        current: &Session,
        transition: F,
    ) -> Result<Session, CommitError>
    where
        F: FnOnce(&Session, DateTime<Utc>) -> Result<Session, TransitionError>,
    {
        let next = transition(current, self.now()).map_err(CommitError::Rejected)?;
        self.sessions
            .apply_transition(&next, current.status())
            .await
            .map_err(CommitError::Store)
    }
}
