//! Availability domain service.
//!
//! Tutors publish and withdraw slots here, and learners read a tutor's
//! future slots reconciled against live sessions.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::availability::{AvailabilitySlot, SlotAvailability, reconcile};
use crate::domain::booking::ConflictDetector;
use crate::domain::booking_service::map_directory_error;
use crate::domain::ports::{
    AddSlotRequest, AvailabilityCommand, AvailabilityQuery, AvailabilityRepository,
    AvailabilityRepositoryError, RemoveSlotRequest, SessionRepository, UserDirectory,
};
use crate::domain::session_lifecycle::map_session_repository_error;
use crate::domain::{Error, UserId};

fn map_availability_error(error: AvailabilityRepositoryError) -> Error {
    match error {
        AvailabilityRepositoryError::Overlap => {
            Error::conflict("slot overlaps an existing availability slot")
        }
        AvailabilityRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("availability repository unavailable: {message}"))
        }
        AvailabilityRepositoryError::Query { message } => {
            Error::internal(format!("availability repository error: {message}"))
        }
    }
}

/// Slot management and reconciled availability reads.
pub struct AvailabilityService<A, S, U> {
    slots: Arc<A>,
    sessions: Arc<S>,
    users: Arc<U>,
    conflicts: ConflictDetector<S>,
    clock: Arc<dyn Clock>,
}

impl<A, S, U> AvailabilityService<A, S, U>
where
    A: AvailabilityRepository,
    S: SessionRepository,
    U: UserDirectory,
{
    pub fn new(slots: Arc<A>, sessions: Arc<S>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            conflicts: ConflictDetector::new(Arc::clone(&sessions)),
            slots,
            sessions,
            users,
            clock,
        }
    }

    async fn require_tutor(&self, user_id: &UserId) -> Result<(), Error> {
        let user = self
            .users
            .find_user(user_id)
            .await
            .map_err(map_directory_error)?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))?;
        if !user.is_tutor() {
            return Err(Error::invalid_request("only tutors can manage availability"));
        }
        Ok(())
    }

    async fn owned_slots(&self, owner_id: &UserId) -> Result<Vec<AvailabilitySlot>, Error> {
        let mut slots = self
            .slots
            .list_for_owner(owner_id)
            .await
            .map_err(map_availability_error)?;
        slots.sort_by(AvailabilitySlot::chronological);
        Ok(slots)
    }
}

#[async_trait]
impl<A, S, U> AvailabilityCommand for AvailabilityService<A, S, U>
where
    A: AvailabilityRepository,
    S: SessionRepository,
    U: UserDirectory,
{
    async fn add_slot(&self, request: AddSlotRequest) -> Result<Vec<AvailabilitySlot>, Error> {
        self.require_tutor(&request.owner_id).await?;
        let slot = AvailabilitySlot::new(
            Uuid::new_v4(),
            request.owner_id,
            request.date,
            request.start_time,
            request.end_time,
        )
        .map_err(|err| Error::invalid_request(err.to_string()))?;
        if slot.window().start() <= self.clock.utc() {
            return Err(Error::invalid_request("slot start time has already passed"));
        }

        let existing = self.owned_slots(slot.owner_id()).await?;
        if existing.iter().any(|other| other.overlaps(&slot)) {
            return Err(Error::conflict("slot overlaps an existing availability slot"));
        }
        self.slots
            .insert_if_free(&slot)
            .await
            .map_err(map_availability_error)?;
        info!(slot_id = %slot.id(), owner_id = %slot.owner_id(), date = %slot.date(), "slot added");

        self.owned_slots(slot.owner_id()).await
    }

    async fn remove_slot(
        &self,
        request: RemoveSlotRequest,
    ) -> Result<Vec<AvailabilitySlot>, Error> {
        let slot = self
            .slots
            .find(&request.owner_id, &request.slot_id)
            .await
            .map_err(map_availability_error)?
            .ok_or_else(|| Error::not_found(format!("slot {} not found", request.slot_id)))?;

        let occupied = self
            .conflicts
            .has_conflict(slot.owner_id(), &slot.window(), None)
            .await
            .map_err(map_session_repository_error)?;
        if occupied {
            return Err(Error::conflict("slot has a live session booked inside it"));
        }

        let removed = self
            .slots
            .delete(&request.owner_id, &request.slot_id)
            .await
            .map_err(map_availability_error)?;
        if !removed {
            return Err(Error::not_found(format!("slot {} not found", request.slot_id)));
        }
        info!(slot_id = %request.slot_id, owner_id = %request.owner_id, "slot removed");

        self.owned_slots(&request.owner_id).await
    }
}

#[async_trait]
impl<A, S, U> AvailabilityQuery for AvailabilityService<A, S, U>
where
    A: AvailabilityRepository,
    S: SessionRepository,
    U: UserDirectory,
{
    async fn list_future_availability(
        &self,
        tutor_id: &UserId,
    ) -> Result<Vec<SlotAvailability>, Error> {
        let today = self.clock.utc().date_naive();
        let slots: Vec<AvailabilitySlot> = self
            .owned_slots(tutor_id)
            .await?
            .into_iter()
            .filter(|slot| slot.date() >= today)
            .collect();
        let (Some(first), Some(last_end)) = (
            slots.first().map(|slot| slot.window().start()),
            slots.iter().map(|slot| slot.window().end()).max(),
        ) else {
            return Ok(Vec::new());
        };

        let sessions = self
            .sessions
            .list_live_for_tutor(tutor_id, first, last_end)
            .await
            .map_err(map_session_repository_error)?;
        Ok(reconcile(slots, &sessions, today))
    }
}

#[cfg(test)]
#[path = "availability_service_tests.rs"]
mod tests;
