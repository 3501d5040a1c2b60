//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Participants mirrored from the identity service.
    users (id) {
        id -> Uuid,
        display_name -> Varchar,
        email -> Nullable<Varchar>,
        is_tutor -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Booked sessions. Never deleted; cancelled rows stay as history.
    ///
    /// The `sessions_no_live_overlap` exclusion constraint rejects a second
    /// pending or confirmed row of one tutor whose window intersects another.
    sessions (id) {
        id -> Uuid,
        tutor_id -> Uuid,
        learner_id -> Uuid,
        subject -> Varchar,
        notes -> Nullable<Varchar>,
        start_at -> Timestamptz,
        end_at -> Timestamptz,
        /// One of `pending`, `confirmed`, `completed`, `cancelled`.
        status -> Varchar,
        cancellation_reason -> Nullable<Text>,
        /// Null for system cancellations.
        cancelled_by -> Nullable<Uuid>,
        /// One of `pending`, `success`, `failure`.
        conference_status -> Varchar,
        event_id -> Nullable<Text>,
        html_link -> Nullable<Text>,
        join_link -> Nullable<Text>,
        review_pending -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tutor-declared availability, one row per slot.
    availability_slots (id) {
        id -> Uuid,
        owner_id -> Uuid,
        slot_date -> Date,
        start_time -> Time,
        end_time -> Time,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Delivered notifications.
    notifications (id) {
        id -> Uuid,
        user_id -> Uuid,
        kind -> Varchar,
        title -> Text,
        message -> Text,
        session_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(availability_slots -> users (owner_id));
diesel::joinable!(notifications -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(availability_slots, notifications, sessions, users);
