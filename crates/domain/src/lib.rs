mod club;
mod event;
mod reminder;
mod shared;
mod user;

pub use chrono_tz::Tz;
pub use club::Club;
pub use event::Event;
pub use reminder::{
    InvalidDelayError, InvalidJobKindError, JobHandle, NotificationPayload, ReminderJob,
    ReminderJobKind, ReminderJobStatus, ReminderTarget,
};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use user::User;
