//! Booking domain service.
//!
//! Implements the booking command and query driving ports. Every write is
//! committed before any external effect runs, and effects never change the
//! result reported to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::booking::{
    Canceller, ConferenceStatus, ConflictDetector, Session, SessionDraft, TimeWindow,
};
use crate::domain::effects::{BookingEffect, EffectDispatcher, meeting_cleanup};
use crate::domain::notification::{
    session_booked, session_cancelled, session_completed, session_confirmed,
};
use crate::domain::ports::{
    BookSessionRequest, BookingCommand, BookingQuery, CancelSessionRequest, GetSessionRequest,
    ListSessionsRequest, SessionActionRequest, SessionRepository, UserDirectory,
    UserDirectoryError,
};
use crate::domain::session_lifecycle::{SessionLifecycle, map_session_repository_error};
use crate::domain::{Error, Participant, UserId};

pub(crate) fn map_directory_error(error: UserDirectoryError) -> Error {
    match error {
        UserDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        UserDirectoryError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
    }
}

/// Session booking and lifecycle service.
pub struct BookingService<S, U> {
    sessions: Arc<S>,
    users: Arc<U>,
    lifecycle: SessionLifecycle<S>,
    conflicts: ConflictDetector<S>,
    effects: EffectDispatcher,
    clock: Arc<dyn Clock>,
}

impl<S, U> BookingService<S, U>
where
    S: SessionRepository,
    U: UserDirectory,
{
    /// Create a booking service over the session store and user directory.
    pub fn new(
        sessions: Arc<S>,
        users: Arc<U>,
        effects: EffectDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            lifecycle: SessionLifecycle::new(Arc::clone(&sessions), Arc::clone(&clock)),
            conflicts: ConflictDetector::new(Arc::clone(&sessions)),
            sessions,
            users,
            effects,
            clock,
        }
    }

    async fn find_participant(&self, user_id: &UserId) -> Result<Option<Participant>, Error> {
        self.users
            .find_user(user_id)
            .await
            .map_err(map_directory_error)
    }

    /// Display name for messages. Lookup failures fall back to `fallback`.
    async fn name_of(&self, user_id: &UserId, fallback: &str) -> String {
        match self.users.find_user(user_id).await {
            Ok(Some(user)) => user.display_name().to_string(),
            Ok(None) => fallback.to_owned(),
            Err(error) => {
                warn!(%user_id, %error, "display name lookup failed");
                fallback.to_owned()
            }
        }
    }

    async fn load_for(&self, session_id: Uuid, user_id: &UserId) -> Result<Session, Error> {
        let session = self.lifecycle.load(session_id).await?;
        if session.role_of(user_id).is_none() {
            return Err(Error::not_found(format!("session {session_id} not found")));
        }
        Ok(session)
    }

    async fn attach_conference(
        &self,
        session: Session,
        tutor: &Participant,
        learner: &Participant,
    ) -> Session {
        let conference = self.effects.create_meeting(&session, tutor, learner).await;
        if conference.status == ConferenceStatus::Pending {
            return session;
        }
        match self
            .sessions
            .record_conference(&session.id(), &conference)
            .await
        {
            Ok(true) => session.with_conference(conference),
            Ok(false) => {
                // Cancelled or swept while the meeting was being created; the
                // cleanup that ran then could not see this event.
                info!(
                    session_id = %session.id(),
                    "session ended before its meeting was recorded"
                );
                let orphan = meeting_cleanup(&session.with_conference(conference));
                self.effects.dispatch(orphan.into_iter().collect()).await;
                session
            }
            Err(error) => {
                warn!(session_id = %session.id(), %error, "failed to record meeting outcome");
                session.with_conference(conference)
            }
        }
    }
}

#[async_trait]
impl<S, U> BookingCommand for BookingService<S, U>
where
    S: SessionRepository,
    U: UserDirectory,
{
    async fn book(&self, request: BookSessionRequest) -> Result<Session, Error> {
        if request.requester == request.tutor_id {
            return Err(Error::invalid_request("you cannot book a session with yourself"));
        }
        let window = TimeWindow::new(request.start_at, request.end_at)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let now = self.clock.utc();
        if window.start() <= now {
            return Err(Error::invalid_request("session start time must be in the future"));
        }

        let tutor = self
            .find_participant(&request.tutor_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("tutor {} not found", request.tutor_id)))?;
        if !tutor.is_tutor() {
            return Err(Error::invalid_request("the selected user is not a tutor"));
        }
        let learner = self
            .find_participant(&request.requester)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {} not found", request.requester)))?;

        let session = Session::new(SessionDraft {
            id: Uuid::new_v4(),
            tutor_id: request.tutor_id,
            learner_id: request.requester,
            subject: request.subject,
            notes: request.notes,
            start_at: window.start(),
            end_at: window.end(),
            created_at: now,
        })
        .map_err(|err| Error::invalid_request(err.to_string()))?;

        let busy = self
            .conflicts
            .has_conflict(session.tutor_id(), session.window(), None)
            .await
            .map_err(map_session_repository_error)?;
        if busy {
            return Err(Error::conflict("tutor already has a session overlapping this time"));
        }
        self.sessions
            .insert_if_free(&session)
            .await
            .map_err(map_session_repository_error)?;
        info!(
            session_id = %session.id(),
            tutor_id = %session.tutor_id(),
            learner_id = %session.learner_id(),
            "session booked"
        );

        let session = self.attach_conference(session, &tutor, &learner).await;
        let booked = session_booked(&session, learner.display_name().as_ref());
        self.effects
            .dispatch(vec![BookingEffect::Notify(booked)])
            .await;
        Ok(session)
    }

    async fn confirm(&self, request: SessionActionRequest) -> Result<Session, Error> {
        let current = self.load_for(request.session_id, &request.actor).await?;
        let confirmed = self
            .lifecycle
            .commit(&current, |session, now| session.confirm(&request.actor, now))
            .await
            .map_err(|err| err.into_error(request.session_id))?;
        info!(session_id = %confirmed.id(), "session confirmed");

        let tutor_name = self.name_of(confirmed.tutor_id(), "Your tutor").await;
        self.effects
            .dispatch(vec![BookingEffect::Notify(session_confirmed(
                &confirmed,
                &tutor_name,
            ))])
            .await;
        Ok(confirmed)
    }

    async fn complete(&self, request: SessionActionRequest) -> Result<Session, Error> {
        let current = self.load_for(request.session_id, &request.actor).await?;
        let completed = self
            .lifecycle
            .commit(&current, |session, now| session.complete(&request.actor, now))
            .await
            .map_err(|err| err.into_error(request.session_id))?;
        info!(session_id = %completed.id(), "session completed");

        let effects = session_completed(&completed)
            .into_iter()
            .map(BookingEffect::Notify)
            .collect();
        self.effects.dispatch(effects).await;
        Ok(completed)
    }

    async fn cancel(&self, request: CancelSessionRequest) -> Result<Session, Error> {
        let current = self.load_for(request.session_id, &request.actor).await?;
        let canceller = Canceller::Participant(request.actor.clone());
        let cancelled = self
            .lifecycle
            .commit(&current, |session, now| {
                session.cancel(&canceller, request.reason.as_deref(), now)
            })
            .await
            .map_err(|err| err.into_error(request.session_id))?;
        info!(session_id = %cancelled.id(), cancelled_by = %request.actor, "session cancelled");

        let actor_name = self.name_of(&request.actor, "A participant").await;
        let mut effects: Vec<BookingEffect> = session_cancelled(&cancelled, &actor_name)
            .into_iter()
            .map(BookingEffect::Notify)
            .collect();
        effects.extend(meeting_cleanup(&cancelled));
        self.effects.dispatch(effects).await;
        Ok(cancelled)
    }
}

#[async_trait]
impl<S, U> BookingQuery for BookingService<S, U>
where
    S: SessionRepository,
    U: UserDirectory,
{
    async fn get_session(&self, request: GetSessionRequest) -> Result<Session, Error> {
        self.load_for(request.session_id, &request.viewer).await
    }

    async fn list_sessions(&self, request: ListSessionsRequest) -> Result<Vec<Session>, Error> {
        let mut sessions = self
            .sessions
            .list_for_participant(&request.user_id, request.role, request.status)
            .await
            .map_err(map_session_repository_error)?;
        sessions.sort_by(|a, b| b.start_at().cmp(&a.start_at()));
        Ok(sessions)
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;
