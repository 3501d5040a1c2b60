//! Notifications raised by booking transitions.
//!
//! Delivery is owned by a [`NotificationSink`](crate::domain::ports::NotificationSink);
//! this module only decides who hears about what.

use std::fmt;

use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::booking::{Cancellation, Session};

const START_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Kind of event a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    SessionBooked,
    SessionConfirmed,
    SessionCancelled,
    SessionCompleted,
    ReviewPending,
    SessionAutoCancelled,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionBooked => "session_booked",
            Self::SessionConfirmed => "session_confirmed",
            Self::SessionCancelled => "session_cancelled",
            Self::SessionCompleted => "session_completed",
            Self::ReviewPending => "review_pending",
            Self::SessionAutoCancelled => "session_auto_cancelled",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message addressed to one user about one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub session_id: Uuid,
}

impl Notification {
    fn about(
        session: &Session,
        user_id: &UserId,
        kind: NotificationKind,
        title: &str,
        message: String,
    ) -> Self {
        Self {
            user_id: user_id.clone(),
            kind,
            title: title.to_owned(),
            message,
            session_id: session.id(),
        }
    }
}

fn starts(session: &Session) -> String {
    session.start_at().format(START_FORMAT).to_string()
}

/// Tell the tutor a learner booked them.
pub fn session_booked(session: &Session, learner_name: &str) -> Notification {
    Notification::about(
        session,
        session.tutor_id(),
        NotificationKind::SessionBooked,
        "New session request",
        format!(
            "{learner_name} booked a {} session on {}. Please confirm it.",
            session.subject(),
            starts(session)
        ),
    )
}

/// Tell the learner the tutor confirmed.
pub fn session_confirmed(session: &Session, tutor_name: &str) -> Notification {
    Notification::about(
        session,
        session.learner_id(),
        NotificationKind::SessionConfirmed,
        "Session confirmed",
        format!(
            "{tutor_name} confirmed your {} session on {}.",
            session.subject(),
            starts(session)
        ),
    )
}

/// Tell both participants a user cancelled.
pub fn session_cancelled(session: &Session, cancelled_by_name: &str) -> Vec<Notification> {
    let reason = session
        .cancellation()
        .map(|Cancellation { reason, .. }| reason.as_str())
        .filter(|reason| !reason.is_empty());
    let message = match reason {
        Some(reason) => format!(
            "{cancelled_by_name} cancelled the {} session on {}. Reason: {reason}",
            session.subject(),
            starts(session)
        ),
        None => format!(
            "{cancelled_by_name} cancelled the {} session on {}.",
            session.subject(),
            starts(session)
        ),
    };
    session
        .participants()
        .into_iter()
        .map(|user| {
            Notification::about(
                session,
                user,
                NotificationKind::SessionCancelled,
                "Session cancelled",
                message.clone(),
            )
        })
        .collect()
}

/// Tell both participants the session completed and ask the learner to review.
pub fn session_completed(session: &Session) -> Vec<Notification> {
    let message = format!(
        "The {} session on {} was marked as completed.",
        session.subject(),
        starts(session)
    );
    let mut notifications: Vec<Notification> = session
        .participants()
        .into_iter()
        .map(|user| {
            Notification::about(
                session,
                user,
                NotificationKind::SessionCompleted,
                "Session completed",
                message.clone(),
            )
        })
        .collect();
    notifications.push(Notification::about(
        session,
        session.learner_id(),
        NotificationKind::ReviewPending,
        "Review your tutor",
        format!("Tell us how your {} session went.", session.subject()),
    ));
    notifications
}

/// Tell both participants the system cancelled an unconfirmed session.
pub fn session_auto_cancelled(session: &Session) -> Vec<Notification> {
    let message = format!(
        "The {} session on {} was cancelled automatically because the tutor did not confirm it in time.",
        session.subject(),
        starts(session)
    );
    session
        .participants()
        .into_iter()
        .map(|user| {
            Notification::about(
                session,
                user,
                NotificationKind::SessionAutoCancelled,
                "Session cancelled automatically",
                message.clone(),
            )
        })
        .collect()
}
