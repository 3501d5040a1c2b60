//! PostgreSQL-backed `SessionRepository` implementation using Diesel ORM.
//!
//! Bookings for one tutor are serialised with a transaction-scoped advisory
//! lock keyed on the tutor id, and the `sessions_no_live_overlap` exclusion
//! constraint backs that up for writers that bypass this adapter. Lifecycle
//! transitions are conditional updates on the expected status.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::OptionalExtension;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::booking::{
    Cancellation, Conference, ConferenceStatus, ParseSessionStatusError, ParticipantRole,
    Session, SessionRecord, SessionStatus,
};
use crate::domain::ports::{SessionRepository, SessionRepositoryError};

use super::error_mapping::{
    SESSION_OVERLAP_CONSTRAINT, map_diesel_error, map_pool_error, violates_constraint,
};
use super::models::{ConferenceUpdate, SessionRow, SessionTransitionUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::sessions;

const LIVE_STATUSES: [&str; 2] = ["pending", "confirmed"];

const TUTOR_LOCK_SQL: &str = "SELECT pg_advisory_xact_lock(hashtext($1))";

/// Diesel-backed implementation of the session repository port.
#[derive(Clone)]
pub struct DieselSessionRepository {
    pool: DbPool,
}

impl DieselSessionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> SessionRepositoryError {
    map_pool_error(error, |message| SessionRepositoryError::connection(message))
}

fn diesel_error(error: diesel::result::Error) -> SessionRepositoryError {
    if violates_constraint(&error, SESSION_OVERLAP_CONSTRAINT) {
        return SessionRepositoryError::overlap();
    }
    map_diesel_error(
        error,
        SessionRepositoryError::query,
        SessionRepositoryError::connection,
    )
}

fn decode_error(err: ParseSessionStatusError) -> SessionRepositoryError {
    SessionRepositoryError::query(err.to_string())
}

fn parse_status(raw: &str) -> Result<SessionStatus, SessionRepositoryError> {
    raw.parse().map_err(decode_error)
}

fn session_to_row(session: &Session) -> SessionRow {
    let record = SessionRecord::from(session.clone());
    let (cancellation_reason, cancelled_by) = match record.cancellation {
        Some(Cancellation {
            reason,
            cancelled_by,
        }) => (Some(reason), cancelled_by.map(|id| *id.as_uuid())),
        None => (None, None),
    };
    SessionRow {
        id: record.id,
        tutor_id: *record.tutor_id.as_uuid(),
        learner_id: *record.learner_id.as_uuid(),
        subject: record.subject,
        notes: record.notes,
        start_at: record.start_at,
        end_at: record.end_at,
        status: record.status.as_str().to_owned(),
        cancellation_reason,
        cancelled_by,
        conference_status: record.conference.status.as_str().to_owned(),
        event_id: record.conference.event_id,
        html_link: record.conference.html_link,
        join_link: record.conference.join_link,
        review_pending: record.review_pending,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

/// Convert a database row into a validated domain session.
fn row_to_session(row: SessionRow) -> Result<Session, SessionRepositoryError> {
    let status = parse_status(&row.status)?;
    let conference_status: ConferenceStatus =
        row.conference_status.parse().map_err(decode_error)?;
    let cancellation = (status == SessionStatus::Cancelled).then(|| Cancellation {
        reason: row.cancellation_reason.unwrap_or_default(),
        cancelled_by: row.cancelled_by.map(UserId::from_uuid),
    });

    Session::try_from(SessionRecord {
        id: row.id,
        tutor_id: UserId::from_uuid(row.tutor_id),
        learner_id: UserId::from_uuid(row.learner_id),
        subject: row.subject,
        notes: row.notes,
        start_at: row.start_at,
        end_at: row.end_at,
        status,
        cancellation,
        conference: Conference {
            status: conference_status,
            event_id: row.event_id,
            html_link: row.html_link,
            join_link: row.join_link,
        },
        review_pending: row.review_pending,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
    .map_err(|err| SessionRepositoryError::query(err.to_string()))
}

fn rows_to_sessions(rows: Vec<SessionRow>) -> Result<Vec<Session>, SessionRepositoryError> {
    rows.into_iter().map(row_to_session).collect()
}

#[async_trait]
impl SessionRepository for DieselSessionRepository {
    async fn insert_if_free(&self, session: &Session) -> Result<(), SessionRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let row = session_to_row(session);
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let inserted = conn
            .transaction::<bool, diesel::result::Error, _>(|conn| {
                async move {
                    sql_query(TUTOR_LOCK_SQL)
                        .bind::<Text, _>(row.tutor_id.to_string())
                        .execute(conn)
                        .await?;

                    let clash = sessions::table
                        .filter(sessions::tutor_id.eq(row.tutor_id))
                        .filter(sessions::status.eq_any(LIVE_STATUSES))
                        .filter(sessions::start_at.lt(row.end_at))
                        .filter(sessions::end_at.gt(row.start_at))
                        .select(sessions::id)
                        .first::<Uuid>(conn)
                        .await
                        .optional()?;
                    if clash.is_some() {
                        return Ok(false);
                    }

                    diesel::insert_into(sessions::table)
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
            Err(SessionRepositoryError::overlap())
        }
    }

    async fn find_by_id(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<Session>, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = sessions::table
            .find(session_id)
            .select(SessionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_session).transpose()
    }

    async fn list_live_for_tutor(
        &self,
        tutor_id: &UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Session>, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = sessions::table
            .filter(sessions::tutor_id.eq(tutor_id.as_uuid()))
            .filter(sessions::status.eq_any(LIVE_STATUSES))
            .filter(sessions::start_at.lt(to))
            .filter(sessions::end_at.gt(from))
            .order(sessions::start_at.asc())
            .select(SessionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows_to_sessions(rows)
    }

    async fn list_for_participant(
        &self,
        user_id: &UserId,
        role: Option<ParticipantRole>,
        status: Option<SessionStatus>,
    ) -> Result<Vec<Session>, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let user = *user_id.as_uuid();

        let mut query = sessions::table.into_boxed();
        query = match role {
            Some(ParticipantRole::Tutor) => query.filter(sessions::tutor_id.eq(user)),
            Some(ParticipantRole::Learner) => query.filter(sessions::learner_id.eq(user)),
            None => query.filter(
                sessions::tutor_id
                    .eq(user)
                    .or(sessions::learner_id.eq(user)),
            ),
        };
        if let Some(status) = status {
            query = query.filter(sessions::status.eq(status.as_str()));
        }

        let rows = query
            .order((sessions::start_at.desc(), sessions::id.desc()))
            .select(SessionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows_to_sessions(rows)
    }

    async fn list_pending_ended_before(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Session>, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = sessions::table
            .filter(sessions::status.eq(SessionStatus::Pending.as_str()))
            .filter(sessions::end_at.lt(now))
            .order(sessions::end_at.asc())
            .select(SessionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows_to_sessions(rows)
    }

    async fn apply_transition(
        &self,
        session: &Session,
        expected: SessionStatus,
    ) -> Result<Session, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let cancellation = session.cancellation();
        let changes = SessionTransitionUpdate {
            status: session.status().as_str(),
            cancellation_reason: cancellation.map(|c| c.reason.as_str()),
            cancelled_by: cancellation
                .and_then(|c| c.cancelled_by.as_ref())
                .map(|id| *id.as_uuid()),
            review_pending: session.review_pending(),
            updated_at: session.updated_at(),
        };

        let stored = diesel::update(
            sessions::table
                .filter(sessions::id.eq(session.id()))
                .filter(sessions::status.eq(expected.as_str())),
        )
        .set(&changes)
        .returning(SessionRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(diesel_error)?;
        if let Some(row) = stored {
            return row_to_session(row);
        }

        let current = sessions::table
            .find(session.id())
            .select(sessions::status)
            .first::<String>(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        match current {
            Some(status) => Err(SessionRepositoryError::stale_status(parse_status(&status)?)),
            None => Err(SessionRepositoryError::not_found()),
        }
    }

    async fn record_conference(
        &self,
        session_id: &Uuid,
        conference: &Conference,
    ) -> Result<bool, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let changes = ConferenceUpdate {
            conference_status: conference.status.as_str(),
            event_id: conference.event_id.as_deref(),
            html_link: conference.html_link.as_deref(),
            join_link: conference.join_link.as_deref(),
        };
        let updated = diesel::update(
            sessions::table
                .filter(sessions::id.eq(session_id))
                .filter(sessions::status.eq_any(LIVE_STATUSES)),
        )
        .set(&changes)
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        if updated > 0 {
            return Ok(true);
        }

        let exists = sessions::table
            .find(session_id)
            .select(sessions::id)
            .first::<Uuid>(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        match exists {
            Some(_) => Ok(false),
            None => Err(SessionRepositoryError::not_found()),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion coverage. Query behaviour runs against embedded
    //! PostgreSQL in `tests/diesel_session_repository.rs`.

    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;
    use crate::domain::booking::{Canceller, SessionDraft};

    fn pending_session() -> Session {
        let start = Utc
            .with_ymd_and_hms(2025, 3, 4, 15, 0, 0)
            .single()
            .expect("valid timestamp");
        Session::new(SessionDraft {
            id: Uuid::new_v4(),
            tutor_id: UserId::random(),
            learner_id: UserId::random(),
            subject: "Linear algebra".to_owned(),
            notes: Some("Eigenvalues".to_owned()),
            start_at: start,
            end_at: start + chrono::TimeDelta::hours(1),
            created_at: start - chrono::TimeDelta::days(1),
        })
        .expect("valid session")
    }

    #[rstest]
    fn pending_session_survives_row_conversion() {
        let session = pending_session();
        let row = session_to_row(&session);

        assert_eq!(row.status, "pending");
        assert_eq!(row.conference_status, "pending");
        assert_eq!(row.cancellation_reason, None);
        assert_eq!(row_to_session(row).expect("decode"), session);
    }

    #[rstest]
    fn system_cancellation_has_no_canceller_column() {
        let session = pending_session();
        let cancelled = session
            .cancel(&Canceller::System, Some("lapsed"), session.start_at())
            .expect("cancel");
        let row = session_to_row(&cancelled);

        assert_eq!(row.status, "cancelled");
        assert_eq!(row.cancellation_reason.as_deref(), Some("lapsed"));
        assert_eq!(row.cancelled_by, None);
        assert_eq!(row_to_session(row).expect("decode"), cancelled);
    }

    #[rstest]
    fn unknown_status_is_a_query_error() {
        let mut row = session_to_row(&pending_session());
        row.status = "archived".to_owned();

        let err = row_to_session(row).expect_err("invalid status");
        assert!(matches!(err, SessionRepositoryError::Query { .. }));
    }
}
