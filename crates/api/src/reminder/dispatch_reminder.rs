use crate::shared::usecase::UseCase;
use campus_domain::{NotificationPayload, ReminderJob, ReminderTarget, User, ID};
use campus_infra::{CampusContext, NotificationError};
use futures::{stream, StreamExt};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sends the notifications of a `ReminderJob` that has become due.
///
/// Recipients, `Event` and `Club` are all read at fire time. A job whose
/// entities have disappeared in the meantime is discarded without error.
#[derive(Debug)]
pub struct DispatchReminderUseCase {
    pub job: ReminderJob,
}

/// What happened when a `ReminderJob` fired
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
    /// Recipients without a device token
    pub skipped_no_token: usize,
    /// A referenced entity no longer exists, nothing was sent
    pub discarded: bool,
}

impl DispatchReport {
    fn discarded() -> Self {
        Self {
            discarded: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    /// Looking up the recipients failed, the job could not run
    JobExecutionFailure(String),
}

fn storage_error(e: anyhow::Error) -> UseCaseError {
    UseCaseError::JobExecutionFailure(e.to_string())
}

#[async_trait::async_trait(?Send)]
impl UseCase for DispatchReminderUseCase {
    type Response = DispatchReport;

    type Error = UseCaseError;

    const NAME: &'static str = "DispatchReminder";

    async fn execute(&mut self, ctx: &CampusContext) -> Result<Self::Response, Self::Error> {
        let report = match &self.job.target {
            ReminderTarget::SingleRecipient { user_id } => {
                self.remind_user(user_id, ctx).await?
            }
            ReminderTarget::ClubFollowers => self.remind_followers(ctx).await?,
        };

        if report.discarded {
            info!(
                job_id = %self.job.id,
                event_id = %self.job.event_id,
                "Reminder discarded because a referenced entity no longer exists"
            );
        }

        Ok(report)
    }
}

impl DispatchReminderUseCase {
    async fn remind_user(
        &self,
        user_id: &ID,
        ctx: &CampusContext,
    ) -> Result<DispatchReport, UseCaseError> {
        let user = ctx.repos.users.find(user_id).await.map_err(storage_error)?;
        let event = ctx
            .repos
            .events
            .find(&self.job.event_id)
            .await
            .map_err(storage_error)?;

        let (user, event) = match (user, event) {
            (Some(user), Some(event)) => (user, event),
            _ => return Ok(DispatchReport::discarded()),
        };

        let payload = NotificationPayload::personal_reminder(&event, &ctx.config.reminder_timezone);
        Ok(self.deliver(vec![user], &payload, ctx).await)
    }

    async fn remind_followers(&self, ctx: &CampusContext) -> Result<DispatchReport, UseCaseError> {
        let event = match ctx
            .repos
            .events
            .find(&self.job.event_id)
            .await
            .map_err(storage_error)?
        {
            Some(event) => event,
            None => return Ok(DispatchReport::discarded()),
        };
        let club_id = match event.club_id {
            Some(club_id) => club_id,
            None => return Ok(DispatchReport::discarded()),
        };
        let club = match ctx.repos.clubs.find(&club_id).await.map_err(storage_error)? {
            Some(club) => club,
            None => return Ok(DispatchReport::discarded()),
        };

        // Current followers, not the ones at schedule time
        let followers = ctx
            .repos
            .users
            .find_many(&club.followers)
            .await
            .map_err(storage_error)?;

        let payload =
            NotificationPayload::club_reminder(&club, &event, &ctx.config.reminder_timezone);
        Ok(self.deliver(followers, &payload, ctx).await)
    }

    /// Sends `payload` to every recipient with a device token. A failed
    /// delivery is counted and logged but never stops the others.
    async fn deliver(
        &self,
        recipients: Vec<User>,
        payload: &NotificationPayload,
        ctx: &CampusContext,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        let mut targets = Vec::with_capacity(recipients.len());
        for user in recipients {
            match user.device_token {
                Some(token) => targets.push((user.id, token)),
                None => {
                    debug!(job_id = %self.job.id, user_id = %user.id, "Recipient has no device token");
                    report.skipped_no_token += 1;
                }
            }
        }

        let outcomes = stream::iter(targets)
            .map(|(user_id, token)| async move {
                let res = send_with_timeout(ctx, &token, payload).await;
                (user_id, token, res)
            })
            .buffer_unordered(ctx.config.notification_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        for (user_id, token, res) in outcomes {
            match res {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        job_id = %self.job.id,
                        event_id = %self.job.event_id,
                        user_id = %user_id,
                        "Reminder delivery failed: {}",
                        e
                    );
                    if let NotificationError::InvalidToken = e {
                        if let Err(e) = ctx.repos.users.clear_device_token(&user_id, &token).await
                        {
                            warn!(user_id = %user_id, "Unable to clear unregistered device token: {:?}", e);
                        }
                    }
                }
            }
        }

        report
    }
}

async fn send_with_timeout(
    ctx: &CampusContext,
    token: &str,
    payload: &NotificationPayload,
) -> Result<(), NotificationError> {
    let timeout_millis = ctx.config.notification_timeout_millis;
    match tokio::time::timeout(
        Duration::from_millis(timeout_millis),
        ctx.notifications.send(token, payload),
    )
    .await
    {
        Ok(res) => res,
        Err(_) => Err(NotificationError::Timeout(timeout_millis)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{millis, setup_context, TestContext};
    use campus_domain::{Club, Event};
    use campus_infra::IUserRepo;
    use std::sync::Arc;

    async fn insert_user(tc: &TestContext, name: &str, token: Option<&str>) -> User {
        let mut user = User::new(name, format!("{}@campus.edu", name));
        user.device_token = token.map(String::from);
        tc.ctx.repos.users.insert(&user).await.unwrap();
        user
    }

    async fn club_event(tc: &TestContext, followers: &[&User]) -> (Club, Event) {
        let club = Club::new("Robotics");
        tc.ctx.repos.clubs.insert(&club).await.unwrap();
        for user in followers {
            tc.ctx
                .repos
                .clubs
                .add_follower(&club.id, &user.id)
                .await
                .unwrap();
        }
        let event = Event::new("Demo day", millis("2025-06-01T10:00:00Z"), Some(club.id));
        tc.ctx.repos.events.insert(&event).await.unwrap();
        (club, event)
    }

    fn followers_job(event: &Event) -> ReminderJob {
        ReminderJob::new(
            ReminderTarget::ClubFollowers,
            event.id,
            millis("2025-06-01T08:00:00Z"),
            millis("2025-06-01T06:00:00Z"),
        )
        .unwrap()
    }

    fn user_job(user: &User, event: &Event) -> ReminderJob {
        ReminderJob::new(
            ReminderTarget::SingleRecipient { user_id: user.id },
            event.id,
            millis("2025-06-01T08:00:00Z"),
            millis("2025-06-01T06:00:00Z"),
        )
        .unwrap()
    }

    #[actix_web::main]
    #[test]
    async fn sends_personal_reminder() {
        let tc = setup_context(millis("2025-06-01T08:00:00Z"));
        let user = insert_user(&tc, "ada", Some("t1")).await;
        let event = Event::new("Career fair", millis("2025-06-01T10:00:00Z"), None);
        tc.ctx.repos.events.insert(&event).await.unwrap();

        let mut usecase = DispatchReminderUseCase {
            job: user_job(&user, &event),
        };
        let report = usecase.execute(&tc.ctx).await.unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(tc.sender.sent_tokens(), vec!["t1".to_string()]);
        assert_eq!(
            tc.sender.sent_payloads()[0],
            NotificationPayload {
                title: "Reminder: Career fair".into(),
                body: "Career fair starts at Sun,  1 Jun 2025 10:00 UTC".into(),
            }
        );
    }

    #[actix_web::main]
    #[test]
    async fn skips_user_without_token() {
        let tc = setup_context(millis("2025-06-01T08:00:00Z"));
        let user = insert_user(&tc, "ada", None).await;
        let event = Event::new("Career fair", millis("2025-06-01T10:00:00Z"), None);
        tc.ctx.repos.events.insert(&event).await.unwrap();

        let mut usecase = DispatchReminderUseCase {
            job: user_job(&user, &event),
        };
        let report = usecase.execute(&tc.ctx).await.unwrap();

        assert_eq!(
            report,
            DispatchReport {
                skipped_no_token: 1,
                ..Default::default()
            }
        );
        assert!(tc.sender.sent_tokens().is_empty());
    }

    #[actix_web::main]
    #[test]
    async fn discards_job_of_deleted_user() {
        let tc = setup_context(millis("2025-06-01T08:00:00Z"));
        let user = insert_user(&tc, "ada", Some("t1")).await;
        let event = Event::new("Career fair", millis("2025-06-01T10:00:00Z"), None);
        tc.ctx.repos.events.insert(&event).await.unwrap();
        tc.ctx.repos.users.delete(&user.id).await.unwrap();

        let mut usecase = DispatchReminderUseCase {
            job: user_job(&user, &event),
        };
        let report = usecase.execute(&tc.ctx).await.unwrap();

        assert!(report.discarded);
        assert!(tc.sender.sent_tokens().is_empty());
    }

    #[actix_web::main]
    #[test]
    async fn sends_to_followers_with_tokens_only() {
        let tc = setup_context(millis("2025-06-01T08:00:00Z"));
        let a = insert_user(&tc, "a", Some("t1")).await;
        let b = insert_user(&tc, "b", None).await;
        let c = insert_user(&tc, "c", Some("t3")).await;
        let (_, event) = club_event(&tc, &[&a, &b, &c]).await;

        let mut usecase = DispatchReminderUseCase {
            job: followers_job(&event),
        };
        let report = usecase.execute(&tc.ctx).await.unwrap();

        assert_eq!(
            report,
            DispatchReport {
                delivered: 2,
                failed: 0,
                skipped_no_token: 1,
                discarded: false,
            }
        );
        assert_eq!(tc.sender.sent_tokens(), vec!["t1".to_string(), "t3".to_string()]);
        assert!(tc
            .sender
            .sent_payloads()
            .iter()
            .all(|p| p.title == "Reminder from Robotics"));
    }

    #[actix_web::main]
    #[test]
    async fn resolves_followers_at_fire_time() {
        let tc = setup_context(millis("2025-06-01T08:00:00Z"));
        let a = insert_user(&tc, "a", Some("t1")).await;
        let (club, event) = club_event(&tc, &[&a]).await;
        let job = followers_job(&event);

        // Followed after the reminder was scheduled
        let d = insert_user(&tc, "d", Some("t4")).await;
        tc.ctx
            .repos
            .clubs
            .add_follower(&club.id, &d.id)
            .await
            .unwrap();
        // Unfollowed after the reminder was scheduled
        tc.ctx
            .repos
            .clubs
            .remove_follower(&club.id, &a.id)
            .await
            .unwrap();

        let mut usecase = DispatchReminderUseCase { job };
        usecase.execute(&tc.ctx).await.unwrap();

        assert_eq!(tc.sender.sent_tokens(), vec!["t4".to_string()]);
    }

    #[actix_web::main]
    #[test]
    async fn failed_delivery_does_not_block_other_followers() {
        let tc = setup_context(millis("2025-06-01T08:00:00Z"));
        let a = insert_user(&tc, "a", Some("t1")).await;
        let b = insert_user(&tc, "b", Some("t2")).await;
        let c = insert_user(&tc, "c", Some("t3")).await;
        let (_, event) = club_event(&tc, &[&a, &b, &c]).await;
        tc.sender.fail_for("t1");
        tc.sender.hang_for("t2");

        let mut usecase = DispatchReminderUseCase {
            job: followers_job(&event),
        };
        let report = usecase.execute(&tc.ctx).await.unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(tc.sender.sent_tokens(), vec!["t3".to_string()]);
    }

    #[actix_web::main]
    #[test]
    async fn clears_unregistered_device_token() {
        let tc = setup_context(millis("2025-06-01T08:00:00Z"));
        let a = insert_user(&tc, "a", Some("stale")).await;
        let (_, event) = club_event(&tc, &[&a]).await;
        tc.sender.unregister("stale");

        let mut usecase = DispatchReminderUseCase {
            job: followers_job(&event),
        };
        let report = usecase.execute(&tc.ctx).await.unwrap();
        assert_eq!(report.failed, 1);

        let user = tc.ctx.repos.users.find(&a.id).await.unwrap().unwrap();
        assert_eq!(user.device_token, None);
    }

    #[actix_web::main]
    #[test]
    async fn discards_job_of_deleted_club() {
        let tc = setup_context(millis("2025-06-01T08:00:00Z"));
        let a = insert_user(&tc, "a", Some("t1")).await;
        let (club, event) = club_event(&tc, &[&a]).await;
        tc.ctx.repos.clubs.delete(&club.id).await.unwrap();

        let mut usecase = DispatchReminderUseCase {
            job: followers_job(&event),
        };
        let report = usecase.execute(&tc.ctx).await.unwrap();

        assert!(report.discarded);
        assert!(tc.sender.sent_tokens().is_empty());
    }

    struct UnreachableUserRepo;

    #[async_trait::async_trait]
    impl IUserRepo for UnreachableUserRepo {
        async fn insert(&self, _: &User) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
        async fn save(&self, _: &User) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
        async fn delete(&self, _: &ID) -> anyhow::Result<Option<User>> {
            anyhow::bail!("connection refused")
        }
        async fn find(&self, _: &ID) -> anyhow::Result<Option<User>> {
            anyhow::bail!("connection refused")
        }
        async fn find_many(&self, _: &[ID]) -> anyhow::Result<Vec<User>> {
            anyhow::bail!("connection refused")
        }
        async fn find_by_email(&self, _: &str) -> anyhow::Result<Option<User>> {
            anyhow::bail!("connection refused")
        }
        async fn find_device_tokens(&self) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("connection refused")
        }
        async fn clear_device_token(&self, _: &ID, _: &str) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    #[actix_web::main]
    #[test]
    async fn storage_failure_is_job_execution_failure() {
        let mut tc = setup_context(millis("2025-06-01T08:00:00Z"));
        let event = Event::new("Career fair", millis("2025-06-01T10:00:00Z"), None);
        tc.ctx.repos.events.insert(&event).await.unwrap();
        tc.ctx.repos.users = Arc::new(UnreachableUserRepo);

        let mut usecase = DispatchReminderUseCase {
            job: user_job(&User::new("ada", "ada@campus.edu"), &event),
        };
        assert!(matches!(
            usecase.execute(&tc.ctx).await,
            Err(UseCaseError::JobExecutionFailure(_))
        ));
    }
}
