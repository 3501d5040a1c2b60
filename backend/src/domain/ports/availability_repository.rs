//! Port for availability slot persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::availability::AvailabilitySlot;

use super::define_port_error;

define_port_error! {
    /// Errors raised by availability repository adapters.
    pub enum AvailabilityRepositoryError {
        /// The owner already has a slot overlapping the new one.
        Overlap => "slot overlaps an existing availability slot",
        /// Repository connection could not be established.
        Connection { message: String } =>
            "availability repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "availability repository query failed: {message}",
    }
}

/// Port for a tutor's availability slots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Every slot of `owner_id`, ordered by date then start time.
    async fn list_for_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Vec<AvailabilitySlot>, AvailabilityRepositoryError>;

    /// Insert a slot unless it overlaps another slot of the same owner.
    async fn insert_if_free(&self, slot: &AvailabilitySlot)
    -> Result<(), AvailabilityRepositoryError>;

    /// Find one slot of `owner_id`.
    async fn find(
        &self,
        owner_id: &UserId,
        slot_id: &Uuid,
    ) -> Result<Option<AvailabilitySlot>, AvailabilityRepositoryError>;

    /// Delete one slot of `owner_id`. Returns `false` when nothing matched.
    async fn delete(
        &self,
        owner_id: &UserId,
        slot_id: &Uuid,
    ) -> Result<bool, AvailabilityRepositoryError>;
}
