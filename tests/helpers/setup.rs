use async_trait::async_trait;
use campus_api::Application;
use campus_domain::NotificationPayload;
use campus_infra::{CampusContext, INotificationSender, NotificationError};
use campus_sdk::CampusSDK;
use std::sync::{Arc, Mutex};

/// Keeps every notification the server sends
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, NotificationPayload)>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<(String, NotificationPayload)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl INotificationSender for RecordingSender {
    async fn send(
        &self,
        device_token: &str,
        payload: &NotificationPayload,
    ) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .unwrap()
            .push((device_token.to_string(), payload.clone()));
        Ok(())
    }
}

pub struct TestApp {
    /// Shares the repositories with the running server
    pub ctx: CampusContext,
    pub notifications: Arc<RecordingSender>,
    pub address: String,
}

// Launch the application as a background task
pub async fn spawn_app() -> (TestApp, CampusSDK) {
    let notifications = Arc::new(RecordingSender::default());
    let mut ctx = CampusContext::create_inmemory();
    ctx.config.port = 0; // Random port
    ctx.config.scheduler_poll_interval_millis = 50;
    ctx.notifications = notifications.clone();

    let application = Application::new(ctx.clone())
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}/api/v1", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    let sdk = CampusSDK::new(address.clone());
    let app = TestApp {
        ctx,
        notifications,
        address,
    };
    (app, sdk)
}
