//! Driving ports for availability management and reconciliation.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::domain::availability::{AvailabilitySlot, SlotAvailability};
use crate::domain::{Error, UserId};

/// Request to publish a new slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddSlotRequest {
    pub owner_id: UserId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Request to withdraw a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveSlotRequest {
    pub owner_id: UserId,
    pub slot_id: Uuid,
}

/// Driving port for slot writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityCommand: Send + Sync {
    /// Add a slot and return every slot of the owner in chronological order.
    async fn add_slot(&self, request: AddSlotRequest) -> Result<Vec<AvailabilitySlot>, Error>;

    /// Remove a slot unless a live session occupies it, returning what remains.
    async fn remove_slot(&self, request: RemoveSlotRequest)
    -> Result<Vec<AvailabilitySlot>, Error>;
}

/// Driving port for reconciled availability reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityQuery: Send + Sync {
    /// Slots dated today or later, each flagged when a live session occupies it.
    async fn list_future_availability(
        &self,
        tutor_id: &UserId,
    ) -> Result<Vec<SlotAvailability>, Error>;
}
