use crate::{APIResponse, BaseClient, ID};
use campus_api_structs::{schedule_followers_reminder, schedule_user_reminder};
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct ReminderClient {
    base: Arc<BaseClient>,
}

pub struct ScheduleUserReminderInput {
    pub user_id: ID,
    pub event_id: ID,
    pub hours_before: f64,
}

pub struct ScheduleFollowersReminderInput {
    pub event_id: ID,
    pub hours_before: f64,
}

impl ReminderClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn schedule_for_user(
        &self,
        input: ScheduleUserReminderInput,
    ) -> APIResponse<schedule_user_reminder::APIResponse> {
        let body = schedule_user_reminder::RequestBody {
            user_id: Some(input.user_id),
            event_id: Some(input.event_id),
            hours_before: Some(input.hours_before),
        };

        self.base
            .post(body, "reminders/user".into(), StatusCode::OK)
            .await
    }

    pub async fn schedule_for_followers(
        &self,
        input: ScheduleFollowersReminderInput,
    ) -> APIResponse<schedule_followers_reminder::APIResponse> {
        let body = schedule_followers_reminder::RequestBody {
            event_id: Some(input.event_id),
            hours_before: Some(input.hours_before),
        };

        self.base
            .post(body, "reminders/followers".into(), StatusCode::OK)
            .await
    }
}
