use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

pub const OPTIMIZE_IMAGE_TASK: &str = "optimize_image";

/// Job descriptor for the photo optimization handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeImagePayload {
    pub event_id: Uuid,
    pub object_key: String,
}

#[derive(Debug, FromRow)]
pub struct ClaimedJob {
    pub job_id: Uuid,
    pub task: String,
    pub payload: serde_json::Value,
    pub attempts: i32,
}

/// Durable at-least-once job queue over the `jobs` table.
///
/// A claim leases the row by pushing `run_at` forward, so a worker that
/// dies mid-job releases it back after the lease expires and the job runs
/// again. Handlers must therefore tolerate re-execution.
#[derive(Clone)]
pub struct JobQueue {
    pool: PgPool,
}

impl JobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Submit an optimization job for `event_id`'s raw photo upload.
    pub async fn enqueue_optimize(
        &self,
        event_id: Uuid,
        object_key: &str,
    ) -> Result<Uuid, sqlx::Error> {
        let payload = json!({ "event_id": event_id, "object_key": object_key });
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO jobs (task, payload) VALUES ($1, $2) RETURNING job_id",
        )
        .bind(OPTIMIZE_IMAGE_TASK)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
    }

    /// Claim the next due job, leasing it for `lease`. `SKIP LOCKED` keeps
    /// concurrent workers from fighting over the same row.
    pub async fn claim_due(&self, lease: Duration) -> Result<Option<ClaimedJob>, sqlx::Error> {
        sqlx::query_as::<_, ClaimedJob>(
            r#"
            UPDATE jobs
            SET run_at = now() + $1 * interval '1 second'
            WHERE job_id = (
                SELECT job_id FROM jobs
                WHERE run_at <= now()
                ORDER BY run_at
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING job_id, task, payload, attempts
            "#,
        )
        .bind(lease.as_secs() as i64)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn complete(&self, job_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM jobs WHERE job_id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Reschedule after a transient failure.
    pub async fn retry_later(
        &self,
        job_id: Uuid,
        attempts: i32,
        delay: Duration,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs SET attempts = $2, run_at = now() + $3 * interval '1 second' WHERE job_id = $1",
        )
        .bind(job_id)
        .bind(attempts)
        .bind(delay.as_secs() as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Drop a terminally failed job. The event's photo stays in its prior
    /// state; the failure is only visible in the logs.
    pub async fn discard(&self, job_id: Uuid) -> Result<(), sqlx::Error> {
        self.complete(job_id).await
    }
}

/// Exponential backoff for transient retries, capped at one hour.
pub fn backoff(base_secs: u64, attempts: i32) -> Duration {
    let exp = attempts.clamp(0, 20) as u32;
    let secs = base_secs.saturating_mul(2u64.saturating_pow(exp));
    Duration::from_secs(secs.min(3600))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        assert_eq!(backoff(2, 0), Duration::from_secs(2));
        assert_eq!(backoff(2, 1), Duration::from_secs(4));
        assert_eq!(backoff(2, 3), Duration::from_secs(16));
        assert_eq!(backoff(2, 30), Duration::from_secs(3600));
    }

    #[test]
    fn optimize_payload_matches_enqueue_shape() {
        // enqueue_optimize writes this shape with serde_json::json!; the
        // worker must be able to read it back as OptimizeImagePayload.
        let event_id = Uuid::new_v4();
        let raw = serde_json::json!({ "event_id": event_id, "object_key": "uploads/cat.heic" });
        let payload: OptimizeImagePayload = serde_json::from_value(raw).unwrap();
        assert_eq!(payload.event_id, event_id);
        assert_eq!(payload.object_key, "uploads/cat.heic");
    }
}
