use async_trait::async_trait;
use campus_domain::NotificationPayload;
use campus_infra::{CampusContext, INotificationSender, ISys, NotificationError};
use chrono::DateTime;
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

pub fn millis(rfc3339: &str) -> i64 {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("Valid date")
        .timestamp_millis()
}

/// Clock that only moves when told to
pub struct TestClock {
    now: AtomicI64,
}

impl TestClock {
    pub fn set(&self, ts: i64) {
        self.now.store(ts, Ordering::SeqCst);
    }
}

impl ISys for TestClock {
    fn get_timestamp_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Records every notification instead of sending it.
/// Tokens can be configured to fail, be rejected as unregistered, be slow
/// or hang.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<(String, NotificationPayload)>>,
    pub failing_tokens: Mutex<HashSet<String>>,
    pub unregistered_tokens: Mutex<HashSet<String>>,
    pub hanging_tokens: Mutex<HashSet<String>>,
    pub slow_tokens: Mutex<HashSet<String>>,
}

impl RecordingSender {
    pub fn fail_for(&self, token: &str) {
        self.failing_tokens.lock().unwrap().insert(token.into());
    }

    pub fn unregister(&self, token: &str) {
        self.unregistered_tokens.lock().unwrap().insert(token.into());
    }

    pub fn hang_for(&self, token: &str) {
        self.hanging_tokens.lock().unwrap().insert(token.into());
    }

    /// Sending to `token` takes 300ms
    pub fn slow_for(&self, token: &str) {
        self.slow_tokens.lock().unwrap().insert(token.into());
    }

    pub fn sent_tokens(&self) -> Vec<String> {
        let mut tokens = self
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|(token, _)| token.clone())
            .collect::<Vec<_>>();
        tokens.sort();
        tokens
    }

    pub fn sent_payloads(&self) -> Vec<NotificationPayload> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

#[async_trait]
impl INotificationSender for RecordingSender {
    async fn send(
        &self,
        device_token: &str,
        payload: &NotificationPayload,
    ) -> Result<(), NotificationError> {
        let hangs = self.hanging_tokens.lock().unwrap().contains(device_token);
        if hangs {
            tokio::time::sleep(Duration::from_secs(60 * 60)).await;
        }
        let slow = self.slow_tokens.lock().unwrap().contains(device_token);
        if slow {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        if self.failing_tokens.lock().unwrap().contains(device_token) {
            return Err(NotificationError::Provider("500: provider down".into()));
        }
        if self.unregistered_tokens.lock().unwrap().contains(device_token) {
            return Err(NotificationError::InvalidToken);
        }
        self.sent
            .lock()
            .unwrap()
            .push((device_token.to_string(), payload.clone()));
        Ok(())
    }
}

pub struct TestContext {
    pub ctx: CampusContext,
    pub clock: Arc<TestClock>,
    pub sender: Arc<RecordingSender>,
}

/// Inmemory context with the clock set to `now`
pub fn setup_context(now: i64) -> TestContext {
    let clock = Arc::new(TestClock {
        now: AtomicI64::new(now),
    });
    let sender = Arc::new(RecordingSender::default());
    let mut ctx = CampusContext::create_inmemory();
    ctx.sys = clock.clone();
    ctx.notifications = sender.clone();
    ctx.config.notification_timeout_millis = 100;
    ctx.config.reminder_timezone = campus_domain::Tz::UTC;

    TestContext { ctx, clock, sender }
}
