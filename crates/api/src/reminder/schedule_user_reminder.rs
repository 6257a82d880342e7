use super::is_valid_hours_before;
use crate::error::CampusError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use campus_api_structs::schedule_user_reminder::*;
use campus_domain::{InvalidDelayError, JobHandle, ReminderJob, ReminderTarget, ID};
use campus_infra::{CampusContext, EnqueueError};

pub async fn schedule_user_reminder_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<CampusContext>,
) -> Result<HttpResponse, CampusError> {
    let body = body.0;
    let usecase = match (body.user_id, body.event_id, body.hours_before) {
        (Some(user_id), Some(event_id), Some(hours_before)) => ScheduleUserReminderUseCase {
            user_id,
            event_id,
            hours_before,
        },
        _ => return Err(CampusError::BadClientData("Missing required fields".into())),
    };

    execute(usecase, &ctx)
        .await
        .map(|handle| {
            HttpResponse::Ok().json(APIResponse::new("Reminder scheduled successfully!", handle))
        })
        .map_err(CampusError::from)
}

/// Reminds a single `User` about an `Event` `hours_before` it starts
#[derive(Debug)]
pub struct ScheduleUserReminderUseCase {
    pub user_id: ID,
    pub event_id: ID,
    pub hours_before: f64,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidHoursBefore(f64),
    UserNotFound(ID),
    EventNotFound(ID),
    InvalidDelay { fire_at: i64, now: i64 },
    StorageError,
}

impl From<InvalidDelayError> for UseCaseError {
    fn from(e: InvalidDelayError) -> Self {
        Self::InvalidDelay {
            fire_at: e.fire_at,
            now: e.now,
        }
    }
}

impl From<EnqueueError> for UseCaseError {
    fn from(e: EnqueueError) -> Self {
        match e {
            EnqueueError::InvalidDelay { fire_at, now } => Self::InvalidDelay { fire_at, now },
            EnqueueError::Storage(_) => Self::StorageError,
        }
    }
}

impl From<UseCaseError> for CampusError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidHoursBefore(hours_before) => Self::BadClientData(format!(
                "hoursBefore must be a positive number of hours, got: {}",
                hours_before
            )),
            UseCaseError::UserNotFound(user_id) => {
                Self::NotFound(format!("The user with id: {}, was not found.", user_id))
            }
            UseCaseError::EventNotFound(event_id) => {
                Self::NotFound(format!("The event with id: {}, was not found.", event_id))
            }
            UseCaseError::InvalidDelay { .. } => Self::BadClientData(
                "The reminder time has already passed. The reminder was not scheduled.".into(),
            ),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for ScheduleUserReminderUseCase {
    type Response = JobHandle;

    type Error = UseCaseError;

    const NAME: &'static str = "ScheduleUserReminder";

    async fn execute(&mut self, ctx: &CampusContext) -> Result<Self::Response, Self::Error> {
        if !is_valid_hours_before(self.hours_before) {
            return Err(UseCaseError::InvalidHoursBefore(self.hours_before));
        }

        let event = ctx
            .repos
            .events
            .find(&self.event_id)
            .await
            .map_err(|_| UseCaseError::StorageError)?
            .ok_or(UseCaseError::EventNotFound(self.event_id))?;

        let user = ctx
            .repos
            .users
            .find(&self.user_id)
            .await
            .map_err(|_| UseCaseError::StorageError)?
            .ok_or(UseCaseError::UserNotFound(self.user_id))?;

        let job = ReminderJob::new(
            ReminderTarget::SingleRecipient { user_id: user.id },
            event.id,
            event.reminder_fire_at(self.hours_before),
            ctx.sys.get_timestamp_millis(),
        )?;

        Ok(ctx.queue().enqueue(job).await?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{millis, setup_context, TestContext};
    use campus_domain::{Event, ReminderJobStatus, User};

    struct Fixture {
        tc: TestContext,
        user: User,
        event: Event,
    }

    async fn setup(now: &str) -> Fixture {
        let tc = setup_context(millis(now));
        let user = User::new("Ada", "ada@campus.edu").with_device_token("t1");
        tc.ctx.repos.users.insert(&user).await.unwrap();
        let event = Event::new("Hackathon kickoff", millis("2025-06-01T10:00:00Z"), None);
        tc.ctx.repos.events.insert(&event).await.unwrap();

        Fixture { tc, user, event }
    }

    #[actix_web::main]
    #[test]
    async fn schedules_reminder_before_event_start() {
        let Fixture { tc, user, event } = setup("2025-06-01T06:00:00Z").await;

        let mut usecase = ScheduleUserReminderUseCase {
            user_id: user.id,
            event_id: event.id,
            hours_before: 2.0,
        };
        let handle = usecase.execute(&tc.ctx).await.unwrap();

        assert_eq!(handle.fire_at, millis("2025-06-01T08:00:00Z"));
        assert_eq!(
            tc.ctx.queue().status(&handle.job_id).await.unwrap(),
            Some(ReminderJobStatus::Pending)
        );
    }

    #[actix_web::main]
    #[test]
    async fn rejects_reminder_time_in_the_past() {
        let Fixture { tc, user, event } = setup("2025-06-01T09:00:00Z").await;

        let mut usecase = ScheduleUserReminderUseCase {
            user_id: user.id,
            event_id: event.id,
            hours_before: 2.0,
        };
        let res = usecase.execute(&tc.ctx).await;

        assert_eq!(
            res.unwrap_err(),
            UseCaseError::InvalidDelay {
                fire_at: millis("2025-06-01T08:00:00Z"),
                now: millis("2025-06-01T09:00:00Z"),
            }
        );
        // Nothing was persisted
        tc.clock.set(millis("2025-06-02T00:00:00Z"));
        assert!(tc.ctx.queue().claim_due("test", 10).await.unwrap().is_empty());
    }

    #[actix_web::main]
    #[test]
    async fn rejects_reminder_exactly_now() {
        let Fixture { tc, user, event } = setup("2025-06-01T08:00:00Z").await;

        let mut usecase = ScheduleUserReminderUseCase {
            user_id: user.id,
            event_id: event.id,
            hours_before: 2.0,
        };
        assert!(matches!(
            usecase.execute(&tc.ctx).await,
            Err(UseCaseError::InvalidDelay { .. })
        ));
    }

    #[actix_web::main]
    #[test]
    async fn rejects_invalid_hours_before() {
        let Fixture { tc, user, event } = setup("2025-06-01T06:00:00Z").await;

        for hours_before in [0.0, -2.0, f64::NAN] {
            let mut usecase = ScheduleUserReminderUseCase {
                user_id: user.id,
                event_id: event.id,
                hours_before,
            };
            assert!(matches!(
                usecase.execute(&tc.ctx).await,
                Err(UseCaseError::InvalidHoursBefore(_))
            ));
        }
    }

    #[actix_web::main]
    #[test]
    async fn rejects_unknown_event_and_user() {
        let Fixture { tc, user, event } = setup("2025-06-01T06:00:00Z").await;

        let mut usecase = ScheduleUserReminderUseCase {
            user_id: user.id,
            event_id: ID::default(),
            hours_before: 2.0,
        };
        assert_eq!(
            usecase.execute(&tc.ctx).await.unwrap_err(),
            UseCaseError::EventNotFound(usecase.event_id)
        );

        let mut usecase = ScheduleUserReminderUseCase {
            user_id: ID::default(),
            event_id: event.id,
            hours_before: 2.0,
        };
        assert_eq!(
            usecase.execute(&tc.ctx).await.unwrap_err(),
            UseCaseError::UserNotFound(usecase.user_id)
        );
    }
}
