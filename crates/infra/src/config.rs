use campus_domain::Tz;
use std::{fmt::Display, str::FromStr};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// How often the delay scheduler looks for due `ReminderJob`s
    pub scheduler_poll_interval_millis: u64,
    /// Maximum number of `ReminderJob`s claimed by one poll
    pub scheduler_batch_size: usize,
    /// A claimed `ReminderJob` without an outcome after this long is
    /// considered abandoned by a crashed worker and is released again.
    pub scheduler_job_lease_millis: i64,
    /// Upper bound for a single call to the push notification provider
    pub notification_timeout_millis: u64,
    /// Maximum in-flight push notifications while fanning out to club followers
    pub notification_concurrency: usize,
    /// Timezone used when telling recipients when an `Event` starts
    pub reminder_timezone: Tz,
    /// Service account credentials for Firebase Cloud Messaging.
    /// Push notifications are only logged when this is missing.
    pub fcm_service_account: Option<String>,
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match std::env::var(name) {
        Ok(value) => match value.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    name, value, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    pub fn new() -> Self {
        let fcm_service_account = match std::env::var("FCM_SERVICE_ACCOUNT") {
            Ok(json) if !json.trim().is_empty() => Some(json),
            _ => {
                info!("Did not find FCM_SERVICE_ACCOUNT environment variable. Push notifications will only be logged.");
                None
            }
        };

        Self {
            port: parse_env("PORT", 5000),
            scheduler_poll_interval_millis: parse_env("SCHEDULER_POLL_INTERVAL_MILLIS", 1000),
            scheduler_batch_size: parse_env("SCHEDULER_BATCH_SIZE", 20),
            scheduler_job_lease_millis: parse_env(
                "SCHEDULER_JOB_LEASE_MILLIS",
                1000 * 60 * 15, // 15 minutes
            ),
            notification_timeout_millis: parse_env("NOTIFICATION_TIMEOUT_MILLIS", 1000 * 10),
            notification_concurrency: parse_env("NOTIFICATION_CONCURRENCY", 8),
            reminder_timezone: parse_env("REMINDER_TIMEZONE", Tz::UTC),
            fcm_service_account,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
