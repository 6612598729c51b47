//! Background token refresh schedule.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::credentials::CredentialRefresher;

/// Builds and starts a scheduler that refreshes the session token every
/// `interval`.
///
/// The job never stops on its own: refresh failures are absorbed by
/// [`CredentialRefresher::refresh`], so the next tick simply tries again.
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process; dropping it stops the schedule.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// job cannot be registered, or the scheduler fails to start.
pub async fn start_refresh_scheduler(
    refresher: Arc<CredentialRefresher>,
    interval: Duration,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let refresher = Arc::clone(&refresher);
        Box::pin(async move {
            tracing::debug!("scheduler: starting token refresh");
            let outcome = refresher.refresh().await;
            tracing::debug!(?outcome, "scheduler: token refresh finished");
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    tracing::info!(
        interval_secs = interval.as_secs(),
        "scheduler: registered token refresh job"
    );
    Ok(scheduler)
}
