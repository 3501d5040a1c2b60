//! Driving port for the expired-session sweep.

use async_trait::async_trait;

use crate::domain::Error;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub cancelled: usize,
    pub errors: usize,
}

/// Runs one pass over pending sessions whose end time has passed.
///
/// The scheduled task and the administrative endpoint both call this.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpirySweep: Send + Sync {
    /// Cancel every lapsed pending session. Fails only when the candidate
    /// list itself cannot be read; per-session failures are counted.
    async fn sweep_expired(&self) -> Result<SweepReport, Error>;
}
