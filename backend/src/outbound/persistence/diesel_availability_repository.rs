//! PostgreSQL-backed `AvailabilityRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::OptionalExtension;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::availability::AvailabilitySlot;
use crate::domain::ports::{AvailabilityRepository, AvailabilityRepositoryError};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewSlotRow, SlotRow};
use super::pool::{DbPool, PoolError};
use super::schema::availability_slots;

const OWNER_LOCK_SQL: &str = "SELECT pg_advisory_xact_lock(hashtext('slots:' || $1))";

/// Diesel-backed implementation of the availability repository port.
#[derive(Clone)]
pub struct DieselAvailabilityRepository {
    pool: DbPool,
}

impl DieselAvailabilityRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> AvailabilityRepositoryError {
    map_pool_error(error, |message| {
        AvailabilityRepositoryError::connection(message)
    })
}

fn diesel_error(error: diesel::result::Error) -> AvailabilityRepositoryError {
    map_diesel_error(
        error,
        AvailabilityRepositoryError::query,
        AvailabilityRepositoryError::connection,
    )
}

fn row_to_slot(row: SlotRow) -> Result<AvailabilitySlot, AvailabilityRepositoryError> {
    AvailabilitySlot::new(
        row.id,
        UserId::from_uuid(row.owner_id),
        row.slot_date,
        row.start_time,
        row.end_time,
    )
    .map_err(|err| AvailabilityRepositoryError::query(err.to_string()))
}

#[async_trait]
impl AvailabilityRepository for DieselAvailabilityRepository {
    async fn list_for_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Vec<AvailabilitySlot>, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = availability_slots::table
            .filter(availability_slots::owner_id.eq(owner_id.as_uuid()))
            .order((
                availability_slots::slot_date.asc(),
                availability_slots::start_time.asc(),
            ))
            .select(SlotRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows.into_iter().map(row_to_slot).collect()
    }

    async fn insert_if_free(
        &self,
        slot: &AvailabilitySlot,
    ) -> Result<(), AvailabilityRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let row = NewSlotRow {
            id: slot.id(),
            owner_id: *slot.owner_id().as_uuid(),
            slot_date: slot.date(),
            start_time: slot.start_time(),
            end_time: slot.end_time(),
        };
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let inserted = conn
            .transaction::<bool, diesel::result::Error, _>(|conn| {
                async move {
                    sql_query(OWNER_LOCK_SQL)
                        .bind::<Text, _>(row.owner_id.to_string())
                        .execute(conn)
                        .await?;

                    let clash = availability_slots::table
                        .filter(availability_slots::owner_id.eq(row.owner_id))
                        .filter(availability_slots::slot_date.eq(row.slot_date))
                        .filter(availability_slots::start_time.lt(row.end_time))
                        .filter(availability_slots::end_time.gt(row.start_time))
                        .select(availability_slots::id)
                        .first::<Uuid>(conn)
                        .await
                        .optional()?;
                    if clash.is_some() {
                        return Ok(false);
                    }

                    diesel::insert_into(availability_slots::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    Ok(true)
                }
                .scope_boxed()
            })
            .await
            .map_err(diesel_error)?;

        if inserted {
            Ok(())
        } else {
            Err(AvailabilityRepositoryError::overlap())
        }
    }

    async fn find(
        &self,
        owner_id: &UserId,
        slot_id: &Uuid,
    ) -> Result<Option<AvailabilitySlot>, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = availability_slots::table
            .filter(availability_slots::id.eq(slot_id))
            .filter(availability_slots::owner_id.eq(owner_id.as_uuid()))
            .select(SlotRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_slot).transpose()
    }

    async fn delete(
        &self,
        owner_id: &UserId,
        slot_id: &Uuid,
    ) -> Result<bool, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(
            availability_slots::table
                .filter(availability_slots::id.eq(slot_id))
                .filter(availability_slots::owner_id.eq(owner_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        Ok(deleted > 0)
    }
}
