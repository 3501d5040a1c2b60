//! Session records, their state machine and scheduling conflicts.

mod conflict;
mod session;

pub use conflict::{ConflictDetector, find_conflict, has_conflict};
pub use session::{
    Cancellation, Canceller, Conference, ConferenceStatus, NOTES_MAX,
    ParseParticipantRoleError, ParseSessionStatusError, ParticipantRole, SUBJECT_MAX, Session,
    SessionDraft, SessionRecord, SessionStatus, SessionValidationError, TimeWindow,
    TransitionError,
};
