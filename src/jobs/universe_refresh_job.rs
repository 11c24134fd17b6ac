use crate::errors::AppError;
use crate::external::price_provider::ProviderError;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use tracing::info;

/// Reloads the tradable symbol list. A failed refresh keeps the current list.
pub async fn refresh_universe(ctx: JobContext) -> Result<JobResult, AppError> {
    match ctx.universe.refresh().await {
        Ok(count) => Ok(JobResult {
            items_processed: count,
            items_failed: 0,
        }),
        Err(ProviderError::RateLimited) => Err(AppError::RateLimited),
        Err(e) => {
            info!("Universe still holds {} symbols", ctx.universe.len());
            Err(AppError::External(format!("Symbol listing refresh failed: {}", e)))
        }
    }
}
