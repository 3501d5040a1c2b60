//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{availability_slots, notifications, sessions, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
    pub is_tutor: bool,
}

// ---------------------------------------------------------------------------
// Session models
// ---------------------------------------------------------------------------

/// Row struct for reading from and inserting into the sessions table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SessionRow {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub learner_id: Uuid,
    pub subject: String,
    pub notes: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: String,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub conference_status: String,
    pub event_id: Option<String>,
    pub html_link: Option<String>,
    pub join_link: Option<String>,
    pub review_pending: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset written by a lifecycle transition.
///
/// `treat_none_as_null` so clearing a cancellation is never skipped.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = sessions)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct SessionTransitionUpdate<'a> {
    pub status: &'a str,
    pub cancellation_reason: Option<&'a str>,
    pub cancelled_by: Option<Uuid>,
    pub review_pending: bool,
    pub updated_at: DateTime<Utc>,
}

/// Changeset written once the calendar provider answered.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = sessions)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ConferenceUpdate<'a> {
    pub conference_status: &'a str,
    pub event_id: Option<&'a str>,
    pub html_link: Option<&'a str>,
    pub join_link: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Availability models
// ---------------------------------------------------------------------------

/// Row struct for reading from the availability_slots table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = availability_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SlotRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Insertable struct for new slots.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = availability_slots)]
pub(crate) struct NewSlotRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

// ---------------------------------------------------------------------------
// Notification models
// ---------------------------------------------------------------------------

/// Insertable struct for delivered notifications.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub(crate) struct NewNotificationRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: &'a str,
    pub title: &'a str,
    pub message: &'a str,
    pub session_id: Option<Uuid>,
}
