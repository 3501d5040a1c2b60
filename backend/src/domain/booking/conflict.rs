//! Scheduling conflict detection.
//!
//! The pure functions here decide overlap over an in-memory set of sessions.
//! [`ConflictDetector`] feeds them from the session repository.

use std::sync::Arc;

use uuid::Uuid;

use super::{Session, TimeWindow};
use crate::domain::UserId;
use crate::domain::ports::{SessionRepository, SessionRepositoryError};

/// First live session of `tutor_id` overlapping `window`, skipping `exclude`.
pub fn find_conflict<'a, I>(
    sessions: I,
    tutor_id: &UserId,
    window: &TimeWindow,
    exclude: Option<Uuid>,
) -> Option<&'a Session>
where
    I: IntoIterator<Item = &'a Session>,
{
    sessions.into_iter().find(|session| {
        session.tutor_id() == tutor_id
            && session.status().is_live()
            && Some(session.id()) != exclude
            && session.window().overlaps(window)
    })
}

/// Whether any live session of `tutor_id` overlaps `window`.
pub fn has_conflict<'a, I>(
    sessions: I,
    tutor_id: &UserId,
    window: &TimeWindow,
    exclude: Option<Uuid>,
) -> bool
where
    I: IntoIterator<Item = &'a Session>,
{
    find_conflict(sessions, tutor_id, window, exclude).is_some()
}

/// Repository-backed conflict check.
pub struct ConflictDetector<R> {
    sessions: Arc<R>,
}

impl<R> Clone for ConflictDetector<R> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<R> ConflictDetector<R>
where
    R: SessionRepository,
{
    pub fn new(sessions: Arc<R>) -> Self {
        Self { sessions }
    }

    /// Whether the tutor already has a live session overlapping `window`.
    pub async fn has_conflict(
        &self,
        tutor_id: &UserId,
        window: &TimeWindow,
        exclude: Option<Uuid>,
    ) -> Result<bool, SessionRepositoryError> {
        let candidates = self
            .sessions
            .list_live_for_tutor(tutor_id, window.start(), window.end())
            .await?;
        Ok(has_conflict(&candidates, tutor_id, window, exclude))
    }
}
