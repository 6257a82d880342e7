use crate::{
    reminder::{DispatchError, DispatchReminderUseCase, DispatchReport},
    shared::usecase::execute,
};
use actix_web::rt::time::interval;
use campus_domain::{ReminderJob, ID};
use campus_infra::{CampusContext, DelayQueue};
use futures::future::join_all;
use std::time::Duration;
use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{error, info, warn};

/// Result of firing a single `ReminderJob`
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The job ran and was removed from the queue
    Completed(DispatchReport),
    /// The job could not run. It stays in the queue as failed.
    Failed(String),
    /// The lease ran out before the job finished and the job was released to
    /// other workers. Delivery was stopped.
    ClaimLost,
}

/// Polls the `DelayQueue` and hands due `ReminderJob`s to the dispatcher.
///
/// Several schedulers may poll the same queue, a job is only ever claimed by
/// one of them. A claimed job has its lease renewed for as long as it runs.
pub struct DelayScheduler {
    ctx: CampusContext,
    worker_id: String,
    shutdown: watch::Sender<bool>,
}

impl DelayScheduler {
    pub fn new(ctx: CampusContext) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            ctx,
            worker_id: format!("worker-{}", ID::new()),
            shutdown,
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Spawns the polling loop on the current actix runtime. The loop runs
    /// until `stop` is called or the `DelayScheduler` is dropped. A poll that
    /// is still running when the next one is due makes the scheduler skip it.
    pub fn start(&self) {
        let ctx = self.ctx.clone();
        let worker_id = self.worker_id.clone();
        let mut shutdown = self.shutdown.subscribe();
        let poll_interval = Duration::from_millis(ctx.config.scheduler_poll_interval_millis.max(1));

        info!(worker_id = %worker_id, "Delay scheduler started");
        actix_web::rt::spawn(async move {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {},
                    _ = shutdown.changed() => break,
                }
                run_cycle(&ctx, &worker_id).await;
            }
            info!(worker_id = %worker_id, "Delay scheduler stopped");
        });
    }

    /// The loop exits once the poll in progress, if any, has finished
    pub fn stop(&self) {
        // Errors only when the loop is already gone
        let _ = self.shutdown.send(true);
    }

    /// Runs one poll: releases abandoned claims, claims the due jobs and
    /// fires them. Returns when every claimed job has an outcome.
    pub async fn run_due_jobs(&self) -> Vec<(ID, JobOutcome)> {
        run_cycle(&self.ctx, &self.worker_id).await
    }
}

async fn run_cycle(ctx: &CampusContext, worker_id: &str) -> Vec<(ID, JobOutcome)> {
    let queue = ctx.queue();

    match queue
        .release_abandoned(ctx.config.scheduler_job_lease_millis)
        .await
    {
        Ok(0) => {}
        Ok(released) => warn!(released, "Released reminder jobs abandoned by a crashed worker"),
        Err(e) => error!("Unable to release abandoned reminder jobs: {:?}", e),
    }

    let jobs = match queue
        .claim_due(worker_id, ctx.config.scheduler_batch_size)
        .await
    {
        Ok(jobs) => jobs,
        Err(e) => {
            error!(worker_id, "Unable to claim due reminder jobs: {:?}", e);
            return Vec::new();
        }
    };

    join_all(jobs.into_iter().map(|job| fire(ctx, worker_id, job))).await
}

/// Three renewals per lease
fn heartbeat_period(ctx: &CampusContext) -> Duration {
    Duration::from_millis((ctx.config.scheduler_job_lease_millis / 3).max(1) as u64)
}

/// Returns false once the claim on the job is gone
async fn renew_claim(queue: &DelayQueue, job_id: &ID, worker_id: &str) -> bool {
    match queue.renew_claim(job_id, worker_id).await {
        Ok(held) => held,
        Err(e) => {
            // Storage hiccup, the next heartbeat tries again
            warn!(job_id = %job_id, "Unable to renew claim on reminder job: {:?}", e);
            true
        }
    }
}

async fn fire(ctx: &CampusContext, worker_id: &str, job: ReminderJob) -> (ID, JobOutcome) {
    let job_id = job.id;
    let event_id = job.event_id;
    let kind = job.kind();
    let queue = ctx.queue();

    let dispatch = execute(DispatchReminderUseCase { job }, ctx);
    tokio::pin!(dispatch);
    let mut heartbeat = interval(heartbeat_period(ctx));
    // The first tick completes immediately, the claim was just taken
    heartbeat.tick().await;

    let res = loop {
        tokio::select! {
            res = &mut dispatch => break Some(res),
            _ = heartbeat.tick() => {
                if !renew_claim(&queue, &job_id, worker_id).await {
                    break None;
                }
            }
        }
    };

    let outcome = match res {
        None => {
            error!(
                job_id = %job_id,
                event_id = %event_id,
                worker_id,
                "Lost claim on running reminder job, delivery stopped"
            );
            JobOutcome::ClaimLost
        }
        Some(Ok(report)) => match queue.complete(&job_id, worker_id).await {
            Ok(true) => {
                info!(
                    job_id = %job_id,
                    event_id = %event_id,
                    kind = kind.as_str(),
                    delivered = report.delivered,
                    failed = report.failed,
                    skipped_no_token = report.skipped_no_token,
                    discarded = report.discarded,
                    "Reminder job completed"
                );
                JobOutcome::Completed(report)
            }
            Ok(false) => {
                warn!(job_id = %job_id, worker_id, "Reminder job was claimed by another worker before it completed");
                JobOutcome::ClaimLost
            }
            Err(e) => {
                // The claim expires and the job is fired again
                error!(job_id = %job_id, "Unable to remove completed reminder job: {:?}", e);
                JobOutcome::Completed(report)
            }
        },
        Some(Err(DispatchError::JobExecutionFailure(reason))) => {
            match queue.fail(&job_id, worker_id, &reason).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(job_id = %job_id, worker_id, "Reminder job was claimed by another worker before it failed")
                }
                Err(e) => {
                    error!(job_id = %job_id, "Unable to mark reminder job as failed: {:?}", e)
                }
            }
            error!(
                job_id = %job_id,
                event_id = %event_id,
                kind = kind.as_str(),
                "Reminder job failed: {}",
                reason
            );
            JobOutcome::Failed(reason)
        }
    };

    (job_id, outcome)
}
