//! Background catalog refresh.
//!
//! Warms the cache once at startup and refreshes it on a cron schedule so
//! request-time refreshes are the exception.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::cache::CatalogService;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// `cron` is not a valid six-field expression, or the scheduler fails to
/// start.
pub async fn build_scheduler(
    catalog: Arc<CatalogService>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_refresh_job(&scheduler, catalog, cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_refresh_job(
    scheduler: &JobScheduler,
    catalog: Arc<CatalogService>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let catalog = Arc::clone(&catalog);

        Box::pin(async move {
            tracing::info!("scheduler: starting catalog refresh");
            refresh(&catalog).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: catalog refresh job registered");
    Ok(())
}

/// Refreshes the catalog once in the background.
pub fn spawn_warmup(catalog: Arc<CatalogService>) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("scheduler: warming catalog cache");
        refresh(&catalog).await;
    })
}

async fn refresh(catalog: &CatalogService) {
    match catalog.force_refresh().await {
        Ok(summary) => tracing::info!(
            beans = summary.count,
            successful = summary.success_count,
            failed = summary.failure_count,
            fetch_ms = u64::try_from(summary.fetch_time.as_millis()).unwrap_or(u64::MAX),
            "scheduler: catalog refresh complete"
        ),
        Err(e) => tracing::error!(error = %e, "scheduler: catalog refresh failed"),
    }
}
