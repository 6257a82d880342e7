use super::is_valid_hours_before;
use crate::error::CampusError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use campus_api_structs::schedule_followers_reminder::*;
use campus_domain::{InvalidDelayError, JobHandle, ReminderJob, ReminderTarget, ID};
use campus_infra::{CampusContext, EnqueueError};

pub async fn schedule_followers_reminder_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<CampusContext>,
) -> Result<HttpResponse, CampusError> {
    let body = body.0;
    let usecase = match (body.event_id, body.hours_before) {
        (Some(event_id), Some(hours_before)) => ScheduleFollowersReminderUseCase {
            event_id,
            hours_before,
        },
        _ => return Err(CampusError::BadClientData("Missing required fields".into())),
    };

    execute(usecase, &ctx)
        .await
        .map(|handle| {
            HttpResponse::Ok().json(APIResponse::new(
                "Reminder scheduled for all followers!",
                handle,
            ))
        })
        .map_err(CampusError::from)
}

/// Reminds everyone following the `Club` that hosts the `Event`.
/// Followers are resolved again when the reminder fires.
#[derive(Debug)]
pub struct ScheduleFollowersReminderUseCase {
    pub event_id: ID,
    pub hours_before: f64,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidHoursBefore(f64),
    EventNotFound(ID),
    ClubNotFound,
    NoRecipients(ID),
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
            UseCaseError::EventNotFound(event_id) => {
                Self::NotFound(format!("The event with id: {}, was not found.", event_id))
            }
            UseCaseError::ClubNotFound => {
                Self::NotFound("The event is not hosted by any existing club.".into())
            }
            UseCaseError::NoRecipients(_) => {
                Self::NotFound("No followers found for this club".into())
            }
            UseCaseError::InvalidDelay { .. } => Self::BadClientData(
                "The reminder time has already passed. The reminder was not scheduled.".into(),
            ),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for ScheduleFollowersReminderUseCase {
    type Response = JobHandle;

    type Error = UseCaseError;

    const NAME: &'static str = "ScheduleFollowersReminder";

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

        let club_id = event.club_id.ok_or(UseCaseError::ClubNotFound)?;
        let club = ctx
            .repos
            .clubs
            .find(&club_id)
            .await
            .map_err(|_| UseCaseError::StorageError)?
            .ok_or(UseCaseError::ClubNotFound)?;

        // Only a hint for the caller, the followers are looked up again at fire time
        if !club.has_followers() {
            return Err(UseCaseError::NoRecipients(club.id));
        }

        let job = ReminderJob::new(
            ReminderTarget::ClubFollowers,
            event.id,
            event.reminder_fire_at(self.hours_before),
            ctx.sys.get_timestamp_millis(),
        )?;

        Ok(ctx.queue().enqueue(job).await?)
    }
}
