mod inmemory;
mod postgres;

use campus_domain::{ReminderJob, ReminderJobStatus, ID};
pub use inmemory::InMemoryReminderJobRepo;
pub use postgres::PostgresReminderJobRepo;

/// Durable storage of `ReminderJob`s ordered by `fire_at`.
///
/// `claim_due` is the only mutual exclusion point between workers: a job
/// is handed out by at most one claim until it is released again. Every
/// write after the claim is conditional on the claiming `worker_id`, so a
/// worker that lost its claim can no longer touch the job.
#[async_trait::async_trait]
pub trait IReminderJobRepo: Send + Sync {
    async fn insert(&self, job: &ReminderJob) -> anyhow::Result<()>;
    /// Atomically marks up to `limit` pending jobs with `fire_at <= now` as running
    /// and returns them, earliest `fire_at` first.
    async fn claim_due(
        &self,
        now: i64,
        worker_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<ReminderJob>>;
    /// Removes a job claimed by `worker_id`. Returns false if the job is gone
    /// or currently claimed by someone else.
    async fn delete(&self, job_id: &ID, worker_id: &str) -> anyhow::Result<bool>;
    /// Marks a job claimed by `worker_id` as failed. Returns false if the job
    /// is gone or currently claimed by someone else.
    async fn mark_failed(&self, job_id: &ID, worker_id: &str, reason: &str) -> anyhow::Result<bool>;
    /// Moves the claim timestamp of a running job held by `worker_id` to `now`.
    /// Returns false if the claim was lost.
    async fn renew_claim(&self, job_id: &ID, worker_id: &str, now: i64) -> anyhow::Result<bool>;
    /// Puts running jobs claimed before `claimed_before` back to pending.
    /// Returns the number of released jobs.
    async fn release_claimed_before(&self, claimed_before: i64) -> anyhow::Result<u64>;
    async fn find_status(&self, job_id: &ID) -> anyhow::Result<Option<ReminderJobStatus>>;
}
