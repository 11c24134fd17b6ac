use crate::errors::AppError;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use tracing::debug;

/// Publishes the current rotation batch.
///
/// Skipped symbols (no usable price) are not failures; only emissions that could not be
/// delivered count against the run.
pub async fn publish_tick(ctx: JobContext) -> Result<JobResult, AppError> {
    let report = ctx.publish_scheduler.tick().await;

    debug!(
        "Tick {:?}: published {}, skipped {}, failed {}",
        report.selected, report.published, report.skipped, report.failed
    );

    Ok(JobResult {
        items_processed: report.published,
        items_failed: report.failed,
    })
}
