mod push;

pub use push::{
    FcmNotificationSender, INotificationSender, LogOnlyNotificationSender, NotificationError,
};
