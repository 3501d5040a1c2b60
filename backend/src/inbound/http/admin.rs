//! Administrative trigger for the expired-session sweep.
//!
//! ```text
//! POST /api/v1/admin/sweeps/expired-sessions
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::SweepReport;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::Caller;
use crate::inbound::http::state::HttpState;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepReportBody {
    /// Sessions moved to cancelled by this pass.
    pub cancelled: usize,
    /// Candidates whose write failed; they are retried on the next pass.
    pub errors: usize,
}

impl From<SweepReport> for SweepReportBody {
    fn from(value: SweepReport) -> Self {
        Self {
            cancelled: value.cancelled,
            errors: value.errors,
        }
    }
}

/// Run one expiry sweep now and report what it did.
#[utoipa::path(
    post,
    path = "/api/v1/admin/sweeps/expired-sessions",
    responses(
        (status = 200, description = "Sweep finished", body = SweepReportBody),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 503, description = "Session store unavailable", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "sweepExpiredSessions",
    security(("SessionCookie" = []))
)]
#[post("/admin/sweeps/expired-sessions")]
pub async fn sweep_expired_sessions(
    state: web::Data<HttpState>,
    caller: Caller,
) -> ApiResult<web::Json<SweepReportBody>> {
    let report = state.sweeper.sweep_expired().await?;
    tracing::info!(
        requested_by = %caller.id(),
        cancelled = report.cancelled,
        errors = report.errors,
        "manual expiry sweep finished"
    );
    Ok(web::Json(SweepReportBody::from(report)))
}
