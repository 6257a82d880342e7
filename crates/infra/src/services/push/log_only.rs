use super::{INotificationSender, NotificationError};
use campus_domain::NotificationPayload;
use tracing::info;

/// Used when no push provider is configured, e.g. during local development
pub struct LogOnlyNotificationSender;

#[async_trait::async_trait]
impl INotificationSender for LogOnlyNotificationSender {
    async fn send(
        &self,
        device_token: &str,
        payload: &NotificationPayload,
    ) -> Result<(), NotificationError> {
        info!(
            device_token,
            title = payload.title.as_str(),
            body = payload.body.as_str(),
            "Push notification (not sent, no provider configured)"
        );
        Ok(())
    }
}
