use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::config;
use crate::jobs::optimize::{self, JobError, OptimizeOutcome};
use crate::jobs::queue::{backoff, ClaimedJob, JobQueue, OptimizeImagePayload, OPTIMIZE_IMAGE_TASK};
use crate::storage::ObjectStore;

/// How long a claimed job stays invisible to other workers. A worker that
/// dies mid-job releases it back after this window.
const CLAIM_LEASE: Duration = Duration::from_secs(60);

/// Poll-and-dispatch loop for the optimization worker process.
pub async fn run_loop(pool: PgPool, store: Arc<dyn ObjectStore>) {
    let cfg = &config::config().worker;
    let poll = Duration::from_secs(cfg.poll_interval_secs);
    let queue = JobQueue::new(pool.clone());

    info!(poll_secs = cfg.poll_interval_secs, "optimization worker started");
    loop {
        match queue.claim_due(CLAIM_LEASE).await {
            Ok(Some(job)) => handle_job(&pool, store.as_ref(), &queue, job).await,
            Ok(None) => tokio::time::sleep(poll).await,
            Err(err) => {
                error!(error = %err, "failed to poll job queue");
                tokio::time::sleep(poll).await;
            }
        }
    }
}

async fn handle_job(pool: &PgPool, store: &dyn ObjectStore, queue: &JobQueue, job: ClaimedJob) {
    let job_id = job.job_id;
    let result = dispatch(pool, store, &job).await;

    match result {
        Ok(()) => {
            if let Err(err) = queue.complete(job_id).await {
                // The lease will re-expose the job; the rerun finds the
                // raw upload already deleted, fails terminally and is
                // dropped, leaving the converged row untouched.
                error!(%job_id, error = %err, "failed to ack completed job");
            }
        }
        Err(JobError::Terminal(msg)) => {
            error!(%job_id, task = %job.task, %msg, "job failed terminally, dropping");
            if let Err(err) = queue.discard(job_id).await {
                error!(%job_id, error = %err, "failed to discard job");
            }
        }
        Err(JobError::Transient(msg)) => {
            let cfg = &config::config().worker;
            let attempts = job.attempts + 1;
            if attempts >= cfg.max_attempts {
                error!(%job_id, %msg, attempts, "job exhausted retries, dropping");
                if let Err(err) = queue.discard(job_id).await {
                    error!(%job_id, error = %err, "failed to discard job");
                }
            } else {
                let delay = backoff(cfg.backoff_base_secs, job.attempts);
                warn!(%job_id, %msg, attempts, delay_secs = delay.as_secs(), "job failed, retrying");
                if let Err(err) = queue.retry_later(job_id, attempts, delay).await {
                    error!(%job_id, error = %err, "failed to reschedule job");
                }
            }
        }
    }
}

async fn dispatch(pool: &PgPool, store: &dyn ObjectStore, job: &ClaimedJob) -> Result<(), JobError> {
    match job.task.as_str() {
        OPTIMIZE_IMAGE_TASK => {
            let payload: OptimizeImagePayload = serde_json::from_value(job.payload.clone())
                .map_err(|e| JobError::Terminal(format!("bad payload: {e}")))?;

            match optimize::run(pool, store, &payload).await? {
                OptimizeOutcome::Updated(event_id) => {
                    info!(%event_id, "event photo converged to optimized copy");
                }
                OptimizeOutcome::EventGone => {}
            }
            Ok(())
        }
        other => Err(JobError::Terminal(format!("unknown task: {other}"))),
    }
}
