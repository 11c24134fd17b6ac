use crate::errors::AppError;
use crate::jobs::{publish_tick_job, universe_refresh_job};
use crate::services::publish_scheduler::PublishScheduler;
use crate::services::symbol_universe::SymbolUniverse;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub universe: Arc<SymbolUniverse>,
    pub publish_scheduler: Arc<PublishScheduler>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSchedule {
    pub tick_interval: Duration,
    pub universe_refresh_interval: Duration,
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
    schedule: JobSchedule,
}

impl JobSchedulerService {
    pub async fn new(context: JobContext, schedule: JobSchedule) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            context,
            schedule,
        })
    }

    /// Runs one universe refresh, then starts both repeated jobs.
    pub async fn start(&mut self) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        execute_job_with_tracking(
            "refresh_universe",
            self.context.clone(),
            Arc::new(universe_refresh_job::refresh_universe),
        )
        .await;

        self.schedule_job(
            self.schedule.universe_refresh_interval,
            "refresh_universe",
            universe_refresh_job::refresh_universe,
        )
        .await?;

        self.schedule_job(
            self.schedule.tick_interval,
            "publish_tick",
            publish_tick_job::publish_tick,
        )
        .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started successfully with 2 jobs");
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }

    async fn schedule_job<F, Fut>(
        &mut self,
        every: Duration,
        job_name: &'static str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_repeated_async(every, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                execute_job_with_tracking(job_name, context, job_fn).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} every {:?}", job_name, every);
        Ok(())
    }
}

// Job tracking wrapper
pub(crate) async fn execute_job_with_tracking<F, Fut>(
    job_name: &str,
    context: JobContext,
    job_fn: Arc<F>,
) -> Option<JobResult>
where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();

    let result = job_fn(context).await;

    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
                job_name, job_result.items_processed, job_result.items_failed, duration_ms
            );
            Some(job_result)
        }
        Err(e) => {
            error!("❌ Job failed: {} - {} (duration: {}ms)", job_name, e, duration_ms);
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobResult {
    pub items_processed: usize,
    pub items_failed: usize,
}
