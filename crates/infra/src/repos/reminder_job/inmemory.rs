use super::IReminderJobRepo;
use campus_domain::{ReminderJob, ReminderJobStatus, ID};
use std::sync::Mutex;

struct StoredJob {
    job: ReminderJob,
    status: ReminderJobStatus,
    worker_id: Option<String>,
}

impl StoredJob {
    fn is_claimed_by(&self, worker_id: &str) -> bool {
        matches!(self.status, ReminderJobStatus::Running { .. })
            && self.worker_id.as_deref() == Some(worker_id)
    }
}

pub struct InMemoryReminderJobRepo {
    jobs: Mutex<Vec<StoredJob>>,
}

impl InMemoryReminderJobRepo {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IReminderJobRepo for InMemoryReminderJobRepo {
    async fn insert(&self, job: &ReminderJob) -> anyhow::Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.push(StoredJob {
            job: job.clone(),
            status: ReminderJobStatus::Pending,
            worker_id: None,
        });
        Ok(())
    }

    async fn claim_due(
        &self,
        now: i64,
        worker_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<ReminderJob>> {
        let mut jobs = self.jobs.lock().unwrap();
        let mut due = jobs
            .iter_mut()
            .filter(|stored| {
                stored.status == ReminderJobStatus::Pending && stored.job.fire_at <= now
            })
            .collect::<Vec<_>>();
        due.sort_by_key(|stored| stored.job.fire_at);

        Ok(due
            .into_iter()
            .take(limit)
            .map(|stored| {
                stored.status = ReminderJobStatus::Running { claimed_at: now };
                stored.worker_id = Some(worker_id.to_string());
                stored.job.clone()
            })
            .collect())
    }

    async fn delete(&self, job_id: &ID, worker_id: &str) -> anyhow::Result<bool> {
        let mut jobs = self.jobs.lock().unwrap();
        let len_before = jobs.len();
        jobs.retain(|stored| !(stored.job.id == *job_id && stored.is_claimed_by(worker_id)));
        Ok(jobs.len() < len_before)
    }

    async fn mark_failed(&self, job_id: &ID, worker_id: &str, reason: &str) -> anyhow::Result<bool> {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs
            .iter_mut()
            .find(|stored| stored.job.id == *job_id && stored.is_claimed_by(worker_id))
        {
            Some(stored) => {
                stored.status = ReminderJobStatus::Failed {
                    reason: reason.to_string(),
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn renew_claim(&self, job_id: &ID, worker_id: &str, now: i64) -> anyhow::Result<bool> {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs
            .iter_mut()
            .find(|stored| stored.job.id == *job_id && stored.is_claimed_by(worker_id))
        {
            Some(stored) => {
                stored.status = ReminderJobStatus::Running { claimed_at: now };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn release_claimed_before(&self, claimed_before: i64) -> anyhow::Result<u64> {
        let mut jobs = self.jobs.lock().unwrap();
        let mut released = 0;
        for stored in jobs.iter_mut() {
            if let ReminderJobStatus::Running { claimed_at } = stored.status {
                if claimed_at < claimed_before {
                    stored.status = ReminderJobStatus::Pending;
                    stored.worker_id = None;
                    released += 1;
                }
            }
        }
        Ok(released)
    }

    async fn find_status(&self, job_id: &ID) -> anyhow::Result<Option<ReminderJobStatus>> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs
            .iter()
            .find(|stored| stored.job.id == *job_id)
            .map(|stored| stored.status.clone()))
    }
}
