//! Automatic cancellation of sessions the tutor never confirmed.
//!
//! A pending session whose end time has passed can no longer take place.
//! Each sweep pass cancels such sessions on behalf of the system, notifies
//! both participants and deletes any meeting that was created.

mod runtime;

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, error, info};

use crate::domain::Error;
use crate::domain::booking::{Canceller, SessionStatus, TransitionError};
use crate::domain::effects::{BookingEffect, EffectDispatcher, meeting_cleanup};
use crate::domain::notification::session_auto_cancelled;
use crate::domain::ports::{ExpirySweep, SessionRepository, SessionRepositoryError, SweepReport};
use crate::domain::session_lifecycle::{CommitError, SessionLifecycle, map_session_repository_error};

pub use runtime::{SweeperHandle, spawn_expiry_sweeper};

/// Reason recorded on sessions cancelled by the sweeper.
pub const AUTO_CANCEL_REASON: &str =
    "Automatically cancelled by the system: the tutor did not confirm before the session ended";

/// Sweep service over the session repository.
pub struct ExpirySweeper<S> {
    sessions: Arc<S>,
    lifecycle: SessionLifecycle<S>,
    effects: EffectDispatcher,
}

impl<S> ExpirySweeper<S>
where
    S: SessionRepository,
{
    pub fn new(sessions: Arc<S>, effects: EffectDispatcher, clock: Arc<dyn Clock>) -> Self {
        Self {
            lifecycle: SessionLifecycle::new(Arc::clone(&sessions), clock),
            sessions,
            effects,
        }
    }
}

#[async_trait]
impl<S> ExpirySweep for ExpirySweeper<S>
where
    S: SessionRepository,
{
    async fn sweep_expired(&self) -> Result<SweepReport, Error> {
        let now = self.lifecycle.now();
        let candidates = self
            .sessions
            .list_pending_ended_before(now)
            .await
            .map_err(map_session_repository_error)?;

        let mut report = SweepReport::default();
        for session in candidates {
            if session.status() != SessionStatus::Pending || session.end_at() >= now {
                continue;
            }
            let outcome = self
                .lifecycle
                .commit(&session, |current, at| {
                    current.cancel(&Canceller::System, Some(AUTO_CANCEL_REASON), at)
                })
                .await;
            match outcome {
                Ok(cancelled) => {
                    report.cancelled += 1;
                    info!(session_id = %cancelled.id(), "expired session cancelled");
                    let mut effects: Vec<BookingEffect> = session_auto_cancelled(&cancelled)
                        .into_iter()
                        .map(BookingEffect::Notify)
                        .collect();
                    effects.extend(meeting_cleanup(&cancelled));
                    self.effects.dispatch(effects).await;
                }
                // Someone else moved the session on between listing and writing.
                Err(
                    CommitError::Rejected(TransitionError::IllegalState { .. })
                    | CommitError::Store(SessionRepositoryError::StaleStatus { .. }),
                ) => {
                    debug!(session_id = %session.id(), "session changed before sweep; skipped");
                }
                Err(err) => {
                    report.errors += 1;
                    let err = err.into_error(session.id());
                    error!(
                        session_id = %session.id(),
                        error = %err,
                        "failed to cancel expired session"
                    );
                }
            }
        }

        if report.cancelled > 0 || report.errors > 0 {
            info!(
                cancelled = report.cancelled,
                errors = report.errors,
                "expiry sweep finished"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests;
