use campus_domain::{JobHandle, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderJobDTO {
    pub job_id: ID,
    /// Timestamp in millis at which the reminder is sent
    pub fire_at: i64,
}

impl ReminderJobDTO {
    pub fn new(handle: JobHandle) -> Self {
        Self {
            job_id: handle.job_id,
            fire_at: handle.fire_at,
        }
    }
}
