use super::IReminderJobRepo;
use campus_domain::{ReminderJob, ReminderJobKind, ReminderJobStatus, ReminderTarget, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use std::convert::TryFrom;
use tracing::error;

pub struct PostgresReminderJobRepo {
    pool: PgPool,
}

impl PostgresReminderJobRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderJobRaw {
    job_uid: Uuid,
    kind: String,
    event_uid: Uuid,
    user_uid: Option<Uuid>,
    fire_at: i64,
    created_at: i64,
}

#[derive(Debug, FromRow)]
struct ReminderJobStatusRaw {
    status: String,
    claimed_at: Option<i64>,
    error_message: Option<String>,
}

impl TryFrom<ReminderJobRaw> for ReminderJob {
    type Error = anyhow::Error;

    fn try_from(raw: ReminderJobRaw) -> Result<Self, Self::Error> {
        let target = match raw.kind.parse::<ReminderJobKind>()? {
            ReminderJobKind::SingleRecipient => match raw.user_uid {
                Some(user_uid) => ReminderTarget::SingleRecipient {
                    user_id: user_uid.into(),
                },
                None => anyhow::bail!("Reminder job {} is missing its recipient", raw.job_uid),
            },
            ReminderJobKind::ClubFollowers => ReminderTarget::ClubFollowers,
        };

        Ok(Self {
            id: raw.job_uid.into(),
            target,
            event_id: raw.event_uid.into(),
            fire_at: raw.fire_at,
            created_at: raw.created_at,
        })
    }
}

impl TryFrom<ReminderJobStatusRaw> for ReminderJobStatus {
    type Error = anyhow::Error;

    fn try_from(raw: ReminderJobStatusRaw) -> Result<Self, Self::Error> {
        match raw.status.as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running {
                claimed_at: raw.claimed_at.unwrap_or_default(),
            }),
            "failed" => Ok(Self::Failed {
                reason: raw.error_message.unwrap_or_default(),
            }),
            other => anyhow::bail!("Unknown reminder job status: {}", other),
        }
    }
}

#[async_trait::async_trait]
impl IReminderJobRepo for PostgresReminderJobRepo {
    async fn insert(&self, job: &ReminderJob) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reminder_jobs
            (job_uid, kind, event_uid, user_uid, fire_at, created_at, status)
            VALUES($1, $2, $3, $4, $5, $6, 'pending')
            "#,
        )
        .bind(job.id.inner_ref())
        .bind(job.kind().as_str())
        .bind(job.event_id.inner_ref())
        .bind(job.user_id().map(|id| id.inner()))
        .bind(job.fire_at)
        .bind(job.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn claim_due(
        &self,
        now: i64,
        worker_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<ReminderJob>> {
        let rows = sqlx::query_as::<_, ReminderJobRaw>(
            r#"
            UPDATE reminder_jobs
            SET status = 'running', claimed_at = $1, worker_id = $2
            WHERE job_uid IN (
                SELECT job_uid FROM reminder_jobs
                WHERE status = 'pending' AND fire_at <= $1
                ORDER BY fire_at
                FOR UPDATE SKIP LOCKED
                LIMIT $3
            )
            RETURNING job_uid, kind, event_uid, user_uid, fire_at, created_at
            "#,
        )
        .bind(now)
        .bind(worker_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut jobs = Vec::with_capacity(rows.len());
        for row in rows {
            let job_uid = row.job_uid;
            match ReminderJob::try_from(row) {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    error!("Unable to read claimed reminder job {}: {:?}", job_uid, e);
                    self.mark_failed(&job_uid.into(), worker_id, &e.to_string())
                        .await?;
                }
            }
        }
        jobs.sort_by_key(|job| job.fire_at);

        Ok(jobs)
    }

    async fn delete(&self, job_id: &ID, worker_id: &str) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            DELETE FROM reminder_jobs AS j
            WHERE j.job_uid = $1 AND j.worker_id = $2 AND j.status = 'running'
            "#,
        )
        .bind(job_id.inner_ref())
        .bind(worker_id)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn mark_failed(&self, job_id: &ID, worker_id: &str, reason: &str) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE reminder_jobs
            SET status = 'failed', error_message = $3
            WHERE job_uid = $1 AND worker_id = $2 AND status = 'running'
            "#,
        )
        .bind(job_id.inner_ref())
        .bind(worker_id)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn renew_claim(&self, job_id: &ID, worker_id: &str, now: i64) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE reminder_jobs
            SET claimed_at = $3
            WHERE job_uid = $1 AND worker_id = $2 AND status = 'running'
            "#,
        )
        .bind(job_id.inner_ref())
        .bind(worker_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn release_claimed_before(&self, claimed_before: i64) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE reminder_jobs
            SET status = 'pending', claimed_at = NULL, worker_id = NULL
            WHERE status = 'running' AND claimed_at < $1
            "#,
        )
        .bind(claimed_before)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected())
    }

    async fn find_status(&self, job_id: &ID) -> anyhow::Result<Option<ReminderJobStatus>> {
        let status = sqlx::query_as::<_, ReminderJobStatusRaw>(
            r#"
            SELECT status, claimed_at, error_message FROM reminder_jobs AS j
            WHERE j.job_uid = $1
            "#,
        )
        .bind(job_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        status.map(ReminderJobStatus::try_from).transpose()
    }
}
