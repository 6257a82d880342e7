mod fcm;
mod log_only;

use campus_domain::NotificationPayload;
pub use fcm::FcmNotificationSender;
pub use log_only::LogOnlyNotificationSender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("The push provider did not answer within {0} ms")]
    Timeout(u64),
    #[error("The device token is not registered anymore")]
    InvalidToken,
    #[error("The push provider rejected the notification: {0}")]
    Provider(String),
    #[error("Unable to reach the push provider: {0}")]
    Transport(String),
}

/// Delivers push notifications to a single device
#[async_trait::async_trait]
pub trait INotificationSender: Send + Sync {
    async fn send(
        &self,
        device_token: &str,
        payload: &NotificationPayload,
    ) -> Result<(), NotificationError>;
}
