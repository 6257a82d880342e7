use crate::dtos::ReminderJobDTO;
use campus_domain::{JobHandle, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderScheduledResponse {
    pub message: String,
    pub job: ReminderJobDTO,
}

impl ReminderScheduledResponse {
    pub fn new(message: impl Into<String>, handle: JobHandle) -> Self {
        Self {
            message: message.into(),
            job: ReminderJobDTO::new(handle),
        }
    }
}

pub mod schedule_user_reminder {
    use super::*;

    /// All fields are optional so that a missing field can be reported
    /// with a proper error message instead of a deserialization error
    #[derive(Debug, Deserialize, Serialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        #[serde(default)]
        pub user_id: Option<ID>,
        #[serde(default)]
        pub event_id: Option<ID>,
        #[serde(default)]
        pub hours_before: Option<f64>,
    }

    pub type APIResponse = ReminderScheduledResponse;
}

pub mod schedule_followers_reminder {
    use super::*;

    #[derive(Debug, Deserialize, Serialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        #[serde(default)]
        pub event_id: Option<ID>,
        #[serde(default)]
        pub hours_before: Option<f64>,
    }

    pub type APIResponse = ReminderScheduledResponse;
}
