//! Periodic execution of sweep passes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span};

use crate::domain::TraceId;
use crate::domain::ports::ExpirySweep;

/// Handle to a running sweeper task.
pub struct SweeperHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop scheduling passes and wait for the loop to exit.
    ///
    /// A pass already in flight runs to completion first.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(join_error) = self.task.await {
            error!(error = %join_error, "expiry sweeper loop ended abnormally");
        }
    }
}

/// Run a sweep pass now and then once every `interval` until shut down.
///
/// Passes run one at a time. A failing or panicking pass is logged and the
/// schedule carries on.
pub fn spawn_expiry_sweeper(sweep: Arc<dyn ExpirySweep>, interval: Duration) -> SweeperHandle {
    let cancel = CancellationToken::new();
    let task = tokio::spawn(sweep_loop(sweep, interval, cancel.clone()));
    info!(interval = ?interval, "expiry sweeper started");
    SweeperHandle { cancel, task }
}

async fn sweep_loop(sweep: Arc<dyn ExpirySweep>, interval: Duration, cancel: CancellationToken) {
    loop {
        run_pass(&sweep).await;
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }
    debug!("expiry sweeper stopped");
}

async fn run_pass(sweep: &Arc<dyn ExpirySweep>) {
    let sweep = Arc::clone(sweep);
    let trace_id = TraceId::generate();
    let pass = tokio::spawn(
        TraceId::scope(trace_id, async move { sweep.sweep_expired().await })
            .instrument(info_span!("expiry_sweep", %trace_id)),
    );
    match pass.await {
        Ok(Ok(report)) => debug!(
            cancelled = report.cancelled,
            errors = report.errors,
            "expiry sweep pass complete"
        ),
        Ok(Err(err)) => error!(error = %err, "expiry sweep pass failed"),
        Err(join_error) => error!(error = %join_error, "expiry sweep pass panicked"),
    }
}
