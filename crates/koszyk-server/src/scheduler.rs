//! Background catalog refresh.
//!
//! When `KOSZYK_REFRESH_CRON` is set, a [`JobScheduler`] refreshes the
//! catalog cache on that schedule so readers rarely pay for a scrape.

use std::sync::Arc;

use koszyk_catalog::CatalogService;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the scheduler, or returns `None` when no schedule is
/// configured.
///
/// The returned handle must be kept alive for the lifetime of the process;
/// dropping it stops the job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if `cron` is not a valid six-field
/// expression or the scheduler fails to start.
pub async fn build_scheduler(
    catalog: Arc<CatalogService>,
    cron: Option<&str>,
) -> Result<Option<JobScheduler>, JobSchedulerError> {
    let Some(cron) = cron else {
        return Ok(None);
    };

    let job = refresh_job(cron, catalog)?;
    let scheduler = JobScheduler::new().await?;
    scheduler.add(job).await?;
    scheduler.start().await?;
    tracing::info!(cron, "scheduler: catalog refresh registered");
    Ok(Some(scheduler))
}

fn refresh_job(cron: &str, catalog: Arc<CatalogService>) -> Result<Job, JobSchedulerError> {
    Job::new_async(cron, move |_uuid, _lock| {
        let catalog = Arc::clone(&catalog);
        Box::pin(async move {
            tracing::info!("scheduler: starting catalog refresh");
            let view = catalog.refresh().await;
            tracing::info!(
                records = view.snapshot.records.len(),
                origin = ?view.snapshot.origin,
                "scheduler: catalog refresh complete"
            );
        })
    })
}
