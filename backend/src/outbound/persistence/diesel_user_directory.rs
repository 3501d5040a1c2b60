//! PostgreSQL-backed `UserDirectory` implementation.

use async_trait::async_trait;
use diesel::OptionalExtension;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{DisplayName, Participant, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::UserRow;
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed lookup of booking participants.
#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserDirectoryError {
    map_pool_error(error, |message| UserDirectoryError::connection(message))
}

fn diesel_error(error: diesel::result::Error) -> UserDirectoryError {
    map_diesel_error(
        error,
        UserDirectoryError::query,
        UserDirectoryError::connection,
    )
}

fn row_to_participant(row: UserRow) -> Result<Participant, UserDirectoryError> {
    let display_name = DisplayName::new(row.display_name)
        .map_err(|err| UserDirectoryError::query(err.to_string()))?;
    let participant = Participant::new(UserId::from_uuid(row.id), display_name, row.is_tutor);
    Ok(match row.email {
        Some(email) => participant.with_email(email),
        None => participant,
    })
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<Participant>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = users::table
            .find(user_id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_participant).transpose()
    }
}
