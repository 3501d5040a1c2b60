//! Session entity and its lifecycle transitions.
//!
//! Transitions are pure: each returns an updated copy of the session or a
//! [`TransitionError`]. Persisting the result is the caller's job, which
//! keeps the guard logic identical for interactive requests and the expiry
//! sweeper.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::UserId;

/// Maximum subject length in characters.
pub const SUBJECT_MAX: usize = 120;
/// Maximum notes length in characters.
pub const NOTES_MAX: usize = 500;

/// Validation failures raised while building sessions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionValidationError {
    #[error("end time must be after start time")]
    InvertedWindow,
    #[error("subject must not be empty")]
    EmptySubject,
    #[error("subject must be at most {max} characters")]
    SubjectTooLong { max: usize },
    #[error("notes must be at most {max} characters")]
    NotesTooLong { max: usize },
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl SessionStatus {
    /// Whether the session still blocks the tutor's time.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Stable lowercase name used on the wire and in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown session status: {0}")]
pub struct ParseSessionStatusError(pub String);

impl FromStr for SessionStatus {
    type Err = ParseSessionStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseSessionStatusError(other.to_owned())),
        }
    }
}

/// Which side of a session a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Tutor,
    Learner,
}

/// Error returned when a role string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown participant role: {0}")]
pub struct ParseParticipantRoleError(pub String);

impl FromStr for ParticipantRole {
    type Err = ParseParticipantRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tutor" => Ok(Self::Tutor),
            "learner" => Ok(Self::Learner),
            other => Err(ParseParticipantRoleError(other.to_owned())),
        }
    }
}

/// Half-open `[start, end)` interval in absolute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SessionValidationError> {
        if end <= start {
            return Err(SessionValidationError::InvertedWindow);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Half-open overlap: windows that only touch at an endpoint do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// Outcome of asking the calendar collaborator for a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConferenceStatus {
    /// No meeting has been created yet, or no calendar provider is configured.
    Pending,
    Success,
    Failure,
}

impl ConferenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl FromStr for ConferenceStatus {
    type Err = ParseSessionStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            other => Err(ParseSessionStatusError(other.to_owned())),
        }
    }
}

/// External meeting fields. Opaque to the booking rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conference {
    pub status: ConferenceStatus,
    pub event_id: Option<String>,
    pub html_link: Option<String>,
    pub join_link: Option<String>,
}

impl Conference {
    pub fn pending() -> Self {
        Self {
            status: ConferenceStatus::Pending,
            event_id: None,
            html_link: None,
            join_link: None,
        }
    }

    pub fn failed() -> Self {
        Self {
            status: ConferenceStatus::Failure,
            ..Self::pending()
        }
    }
}

/// Who cancelled a session and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancellation {
    pub reason: String,
    /// `None` when the system cancelled the session.
    pub cancelled_by: Option<UserId>,
}

/// Actor requesting a cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Canceller {
    Participant(UserId),
    System,
}

/// Guard violations raised by lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {action} a session that is {from}")]
    IllegalState {
        action: &'static str,
        from: SessionStatus,
    },
    #[error("only the tutor can confirm a session")]
    NotTutor,
    #[error("user is not a participant of this session")]
    NotParticipant,
}

/// Input for creating a new pending session.
#[derive(Debug, Clone)]
pub struct SessionDraft {
    pub id: Uuid,
    pub tutor_id: UserId,
    pub learner_id: UserId,
    pub subject: String,
    pub notes: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Flat representation of every session field, used by storage adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: Uuid,
    pub tutor_id: UserId,
    pub learner_id: UserId,
    pub subject: String,
    pub notes: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub cancellation: Option<Cancellation>,
    pub conference: Conference,
    pub review_pending: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A booked tutoring appointment between one tutor and one learner.
///
/// ## Invariants
/// - `end_at` is strictly after `start_at`.
/// - `subject` is non-blank and at most [`SUBJECT_MAX`] characters.
/// - `notes`, when present, is non-blank and at most [`NOTES_MAX`] characters.
/// - `cancellation` is present exactly when `status` is `Cancelled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: Uuid,
    tutor_id: UserId,
    learner_id: UserId,
    subject: String,
    notes: Option<String>,
    window: TimeWindow,
    status: SessionStatus,
    cancellation: Option<Cancellation>,
    conference: Conference,
    review_pending: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn normalise_subject(raw: &str) -> Result<String, SessionValidationError> {
    let subject = raw.trim();
    if subject.is_empty() {
        return Err(SessionValidationError::EmptySubject);
    }
    if subject.chars().count() > SUBJECT_MAX {
        return Err(SessionValidationError::SubjectTooLong { max: SUBJECT_MAX });
    }
    Ok(subject.to_owned())
}

fn normalise_notes(raw: Option<&str>) -> Result<Option<String>, SessionValidationError> {
    let Some(notes) = raw.map(str::trim).filter(|notes| !notes.is_empty()) else {
        return Ok(None);
    };
    if notes.chars().count() > NOTES_MAX {
        return Err(SessionValidationError::NotesTooLong { max: NOTES_MAX });
    }
    Ok(Some(notes.to_owned()))
}

impl Session {
    /// Create a new pending session from a validated draft.
    pub fn new(draft: SessionDraft) -> Result<Self, SessionValidationError> {
        let window = TimeWindow::new(draft.start_at, draft.end_at)?;
        Ok(Self {
            id: draft.id,
            tutor_id: draft.tutor_id,
            learner_id: draft.learner_id,
            subject: normalise_subject(&draft.subject)?,
            notes: normalise_notes(draft.notes.as_deref())?,
            window,
            status: SessionStatus::Pending,
            cancellation: None,
            conference: Conference::pending(),
            review_pending: false,
            created_at: draft.created_at,
            updated_at: draft.created_at,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tutor_id(&self) -> &UserId {
        &self.tutor_id
    }

    pub fn learner_id(&self) -> &UserId {
        &self.learner_id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn start_at(&self) -> DateTime<Utc> {
        self.window.start()
    }

    pub fn end_at(&self) -> DateTime<Utc> {
        self.window.end()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn cancellation(&self) -> Option<&Cancellation> {
        self.cancellation.as_ref()
    }

    pub fn conference(&self) -> &Conference {
        &self.conference
    }

    pub fn review_pending(&self) -> bool {
        self.review_pending
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Role `user` plays in this session, if any.
    pub fn role_of(&self, user: &UserId) -> Option<ParticipantRole> {
        if *user == self.tutor_id {
            Some(ParticipantRole::Tutor)
        } else if *user == self.learner_id {
            Some(ParticipantRole::Learner)
        } else {
            None
        }
    }

    /// Both participants, tutor first.
    pub fn participants(&self) -> [&UserId; 2] {
        [&self.tutor_id, &self.learner_id]
    }

    /// Pending → Confirmed, tutor only.
    pub fn confirm(&self, actor: &UserId, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        match self.role_of(actor) {
            None => return Err(TransitionError::NotParticipant),
            Some(ParticipantRole::Learner) => return Err(TransitionError::NotTutor),
            Some(ParticipantRole::Tutor) => {}
        }
        if self.status != SessionStatus::Pending {
            return Err(self.illegal("confirm"));
        }
        Ok(self.with_status(SessionStatus::Confirmed, now))
    }

    /// Pending or Confirmed → Completed, either participant.
    pub fn complete(&self, actor: &UserId, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        if self.role_of(actor).is_none() {
            return Err(TransitionError::NotParticipant);
        }
        if !self.status.is_live() {
            return Err(self.illegal("complete"));
        }
        let mut next = self.with_status(SessionStatus::Completed, now);
        next.review_pending = true;
        Ok(next)
    }

    /// Pending or Confirmed → Cancelled, either participant or the system.
    pub fn cancel(
        &self,
        by: &Canceller,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, TransitionError> {
        let cancelled_by = match by {
            Canceller::Participant(user) => {
                if self.role_of(user).is_none() {
                    return Err(TransitionError::NotParticipant);
                }
                Some(user.clone())
            }
            Canceller::System => None,
        };
        if !self.status.is_live() {
            return Err(self.illegal("cancel"));
        }
        let mut next = self.with_status(SessionStatus::Cancelled, now);
        next.cancellation = Some(Cancellation {
            reason: reason.map(str::trim).unwrap_or_default().to_owned(),
            cancelled_by,
        });
        Ok(next)
    }

    /// Attach the meeting outcome without touching the lifecycle status.
    pub fn with_conference(&self, conference: Conference) -> Self {
        Self {
            conference,
            ..self.clone()
        }
    }

    fn with_status(&self, status: SessionStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            updated_at: now,
            ..self.clone()
        }
    }

    fn illegal(&self, action: &'static str) -> TransitionError {
        TransitionError::IllegalState {
            action,
            from: self.status,
        }
    }
}

impl TryFrom<SessionRecord> for Session {
    type Error = SessionValidationError;

    fn try_from(value: SessionRecord) -> Result<Self, Self::Error> {
        let window = TimeWindow::new(value.start_at, value.end_at)?;
        let cancellation = match value.status {
            SessionStatus::Cancelled => Some(value.cancellation.unwrap_or(Cancellation {
                reason: String::new(),
                cancelled_by: None,
            })),
            _ => None,
        };
        Ok(Self {
            id: value.id,
            tutor_id: value.tutor_id,
            learner_id: value.learner_id,
            subject: normalise_subject(&value.subject)?,
            notes: normalise_notes(value.notes.as_deref())?,
            window,
            status: value.status,
            cancellation,
            conference: value.conference,
            review_pending: value.review_pending,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

impl From<Session> for SessionRecord {
    fn from(value: Session) -> Self {
        Self {
            id: value.id,
            tutor_id: value.tutor_id,
            learner_id: value.learner_id,
            subject: value.subject,
            notes: value.notes,
            start_at: value.window.start(),
            end_at: value.window.end(),
            status: value.status,
            cancellation: value.cancellation,
            conference: value.conference,
            review_pending: value.review_pending,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
