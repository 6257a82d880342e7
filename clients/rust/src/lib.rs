mod base;
mod reminder;
mod status;
mod user;

pub(crate) use base::BaseClient;
pub use base::{APIError, APIResponse};
pub use campus_api_structs::dtos::*;
pub use campus_domain::ID;
use reminder::ReminderClient;
pub use reminder::{ScheduleFollowersReminderInput, ScheduleUserReminderInput};
use status::StatusClient;
use std::sync::Arc;
use user::UserClient;

/// Campus Server SDK
///
/// The SDK contains methods for interacting with the reminder API of the
/// campus server.
#[derive(Clone)]
pub struct CampusSDK {
    pub reminder: ReminderClient,
    pub status: StatusClient,
    pub user: UserClient,
}

impl CampusSDK {
    /// `address` is the base url of the api, e.g. `http://localhost:5000/api/v1`
    pub fn new(address: String) -> Self {
        let base = Arc::new(BaseClient::new(address));
        let reminder = ReminderClient::new(base.clone());
        let status = StatusClient::new(base.clone());
        let user = UserClient::new(base);

        Self {
            reminder,
            status,
            user,
        }
    }
}
