use crate::{repos::IReminderJobRepo, system::ISys};
use campus_domain::{JobHandle, ReminderJob, ReminderJobStatus, ID};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum EnqueueError {
    #[error("Job would fire at {fire_at} which is not after {now}")]
    InvalidDelay { fire_at: i64, now: i64 },
    #[error("Unable to persist job: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Durable, time ordered queue of `ReminderJob`s.
///
/// Jobs survive restarts because they only live in the `IReminderJobRepo`.
/// A job is handed to a worker through `claim_due` and stays claimed until
/// the worker reports an outcome with `complete` or `fail`, or until the claim
/// is released by `release_abandoned`. A worker keeps its claim alive with
/// `renew_claim` while the job runs.
#[derive(Clone)]
pub struct DelayQueue {
    jobs: Arc<dyn IReminderJobRepo>,
    sys: Arc<dyn ISys>,
}

impl DelayQueue {
    pub fn new(jobs: Arc<dyn IReminderJobRepo>, sys: Arc<dyn ISys>) -> Self {
        Self { jobs, sys }
    }

    pub async fn enqueue(&self, job: ReminderJob) -> Result<JobHandle, EnqueueError> {
        let now = self.sys.get_timestamp_millis();
        if job.fire_at <= now {
            return Err(EnqueueError::InvalidDelay {
                fire_at: job.fire_at,
                now,
            });
        }
        self.jobs.insert(&job).await?;
        info!(
            job_id = %job.id,
            event_id = %job.event_id,
            kind = job.kind().as_str(),
            fire_at = job.fire_at,
            "Reminder job enqueued"
        );

        Ok(job.handle())
    }

    /// Claims up to `limit` jobs whose `fire_at` has passed
    pub async fn claim_due(&self, worker_id: &str, limit: usize) -> anyhow::Result<Vec<ReminderJob>> {
        let now = self.sys.get_timestamp_millis();
        self.jobs.claim_due(now, worker_id, limit).await
    }

    /// The job fired, it is discarded. Returns false if `worker_id` no longer
    /// holds the claim.
    pub async fn complete(&self, job_id: &ID, worker_id: &str) -> anyhow::Result<bool> {
        self.jobs.delete(job_id, worker_id).await
    }

    /// The job errored. It is kept as failed and never handed out again.
    /// Returns false if `worker_id` no longer holds the claim.
    pub async fn fail(&self, job_id: &ID, worker_id: &str, reason: &str) -> anyhow::Result<bool> {
        self.jobs.mark_failed(job_id, worker_id, reason).await
    }

    /// Extends the lease of a job that `worker_id` is still running
    pub async fn renew_claim(&self, job_id: &ID, worker_id: &str) -> anyhow::Result<bool> {
        let now = self.sys.get_timestamp_millis();
        self.jobs.renew_claim(job_id, worker_id, now).await
    }

    /// Releases claims that are older than `lease_millis`, so that jobs held by
    /// a crashed worker are picked up again.
    pub async fn release_abandoned(&self, lease_millis: i64) -> anyhow::Result<u64> {
        let now = self.sys.get_timestamp_millis();
        self.jobs.release_claimed_before(now - lease_millis).await
    }

    pub async fn status(&self, job_id: &ID) -> anyhow::Result<Option<ReminderJobStatus>> {
        self.jobs.find_status(job_id).await
    }
}
