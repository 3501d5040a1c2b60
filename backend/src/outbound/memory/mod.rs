//! In-memory document store used when no database is configured.
//!
//! Sessions and slots live behind one mutex, so every check-then-write runs
//! as a single critical section. That gives the same atomicity the Diesel
//! adapters get from advisory locks and conditional updates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::availability::AvailabilitySlot;
use crate::domain::booking::{Conference, ParticipantRole, Session, SessionStatus};
use crate::domain::ports::{
    AvailabilityRepository, AvailabilityRepositoryError, SessionRepository,
    SessionRepositoryError, UserDirectory, UserDirectoryError,
};
use crate::domain::{Participant, UserId};

mod seed;

pub use seed::{RosterError, load_roster, parse_roster};

#[derive(Default)]
struct Documents {
    sessions: HashMap<Uuid, Session>,
    slots: Vec<AvailabilitySlot>,
}

/// Session and availability repositories over process memory.
#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    documents: Arc<Mutex<Documents>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Documents>, String> {
        self.documents
            .lock()
            .map_err(|_| "in-memory store lock poisoned".to_owned())
    }
}

fn live_overlap(documents: &Documents, candidate: &Session) -> bool {
    documents.sessions.values().any(|existing| {
        existing.id() != candidate.id()
            && existing.tutor_id() == candidate.tutor_id()
            && existing.status().is_live()
            && existing.window().overlaps(candidate.window())
    })
}

#[async_trait]
impl SessionRepository for InMemoryBookingStore {
    async fn insert_if_free(&self, session: &Session) -> Result<(), SessionRepositoryError> {
        let mut documents = self.lock().map_err(SessionRepositoryError::connection)?;
        if live_overlap(&documents, session) {
            return Err(SessionRepositoryError::overlap());
        }
        documents.sessions.insert(session.id(), session.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<Session>, SessionRepositoryError> {
        let documents = self.lock().map_err(SessionRepositoryError::connection)?;
        Ok(documents.sessions.get(session_id).cloned())
    }

    async fn list_live_for_tutor(
        &self,
        tutor_id: &UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Session>, SessionRepositoryError> {
        let documents = self.lock().map_err(SessionRepositoryError::connection)?;
        let mut sessions: Vec<Session> = documents
            .sessions
            .values()
            .filter(|session| {
                session.tutor_id() == tutor_id
                    && session.status().is_live()
                    && session.start_at() < to
                    && session.end_at() > from
            })
            .cloned()
            .collect();
        sessions.sort_by_key(Session::start_at);
        Ok(sessions)
    }

    async fn list_for_participant(
        &self,
        user_id: &UserId,
        role: Option<ParticipantRole>,
        status: Option<SessionStatus>,
    ) -> Result<Vec<Session>, SessionRepositoryError> {
        let documents = self.lock().map_err(SessionRepositoryError::connection)?;
        let mut sessions: Vec<Session> = documents
            .sessions
            .values()
            .filter(|session| match (session.role_of(user_id), role) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(wanted)) => actual == wanted,
            })
            .filter(|session| status.is_none_or(|wanted| session.status() == wanted))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.start_at().cmp(&a.start_at()).then(b.id().cmp(&a.id())));
        Ok(sessions)
    }

    async fn list_pending_ended_before(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Session>, SessionRepositoryError> {
        let documents = self.lock().map_err(SessionRepositoryError::connection)?;
        let mut sessions: Vec<Session> = documents
            .sessions
            .values()
            .filter(|session| session.status() == SessionStatus::Pending && session.end_at() < now)
            .cloned()
            .collect();
        sessions.sort_by_key(Session::end_at);
        Ok(sessions)
    }

    async fn apply_transition(
        &self,
        session: &Session,
        expected: SessionStatus,
    ) -> Result<Session, SessionRepositoryError> {
        let mut documents = self.lock().map_err(SessionRepositoryError::connection)?;
        let Some(stored) = documents.sessions.get_mut(&session.id()) else {
            return Err(SessionRepositoryError::not_found());
        };
        if stored.status() != expected {
            return Err(SessionRepositoryError::stale_status(stored.status()));
        }
        *stored = session.with_conference(stored.conference().clone());
        Ok(stored.clone())
    }

    async fn record_conference(
        &self,
        session_id: &Uuid,
        conference: &Conference,
    ) -> Result<bool, SessionRepositoryError> {
        let mut documents = self.lock().map_err(SessionRepositoryError::connection)?;
        let Some(stored) = documents.sessions.get_mut(session_id) else {
            return Err(SessionRepositoryError::not_found());
        };
        if !stored.status().is_live() {
            return Ok(false);
        }
        *stored = stored.with_conference(conference.clone());
        Ok(true)
    }
}

#[async_trait]
impl AvailabilityRepository for InMemoryBookingStore {
    async fn list_for_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Vec<AvailabilitySlot>, AvailabilityRepositoryError> {
        let documents = self
            .lock()
            .map_err(AvailabilityRepositoryError::connection)?;
        let mut slots: Vec<AvailabilitySlot> = documents
            .slots
            .iter()
            .filter(|slot| slot.owner_id() == owner_id)
            .cloned()
            .collect();
        slots.sort_by(AvailabilitySlot::chronological);
        Ok(slots)
    }

    async fn insert_if_free(
        &self,
        slot: &AvailabilitySlot,
    ) -> Result<(), AvailabilityRepositoryError> {
        let mut documents = self
            .lock()
            .map_err(AvailabilityRepositoryError::connection)?;
        let taken = documents
            .slots
            .iter()
            .any(|existing| existing.owner_id() == slot.owner_id() && existing.overlaps(slot));
        if taken {
            return Err(AvailabilityRepositoryError::overlap());
        }
        documents.slots.push(slot.clone());
        Ok(())
    }

    async fn find(
        &self,
        owner_id: &UserId,
        slot_id: &Uuid,
    ) -> Result<Option<AvailabilitySlot>, AvailabilityRepositoryError> {
        let documents = self
            .lock()
            .map_err(AvailabilityRepositoryError::connection)?;
        Ok(documents
            .slots
            .iter()
            .find(|slot| slot.owner_id() == owner_id && slot.id() == *slot_id)
            .cloned())
    }

    async fn delete(
        &self,
        owner_id: &UserId,
        slot_id: &Uuid,
    ) -> Result<bool, AvailabilityRepositoryError> {
        let mut documents = self
            .lock()
            .map_err(AvailabilityRepositoryError::connection)?;
        let before = documents.slots.len();
        documents
            .slots
            .retain(|slot| !(slot.owner_id() == owner_id && slot.id() == *slot_id));
        Ok(documents.slots.len() < before)
    }
}

/// Participants registered in process memory.
#[derive(Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<UserId, Participant>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a participant.
    pub fn upsert(&self, participant: Participant) {
        match self.users.write() {
            Ok(mut users) => {
                users.insert(participant.id().clone(), participant);
            }
            Err(_) => tracing::error!("in-memory user directory lock poisoned"),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<Participant>, UserDirectoryError> {
        let users = self
            .users
            .read()
            .map_err(|_| UserDirectoryError::connection("in-memory user directory lock poisoned"))?;
        Ok(users.get(user_id).cloned())
    }
}
