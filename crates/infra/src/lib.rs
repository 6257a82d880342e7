mod config;
mod queue;
mod repos;
mod services;
mod system;

pub use config::Config;
pub use queue::{DelayQueue, EnqueueError};
pub use repos::{IClubRepo, IEventRepo, IReminderJobRepo, IUserRepo, Repos};
pub use services::*;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::ISys;
use system::RealSys;
use tracing::{info, warn};

#[derive(Clone)]
pub struct CampusContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub notifications: Arc<dyn INotificationSender>,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

impl CampusContext {
    /// Context backed by inmemory repositories. Used by tests and when
    /// the server is started with the `inmemory` argument.
    pub fn create_inmemory() -> Self {
        let config = Config::new();
        let notifications = create_notification_sender(&config);
        Self {
            repos: Repos::create_inmemory(),
            config,
            sys: Arc::new(RealSys {}),
            notifications,
        }
    }

    async fn create(params: ContextParams) -> Self {
        let repos = Repos::create_postgres(&params.postgres_connection_string)
            .await
            .expect("Postgres credentials must be set and valid");
        let config = Config::new();
        let notifications = create_notification_sender(&config);
        Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            notifications,
        }
    }

    /// The queue of pending `ReminderJob`s, using the clock of this context
    pub fn queue(&self) -> DelayQueue {
        DelayQueue::new(self.repos.reminder_jobs.clone(), self.sys.clone())
    }
}

fn create_notification_sender(config: &Config) -> Arc<dyn INotificationSender> {
    match &config.fcm_service_account {
        Some(service_account) => {
            match FcmNotificationSender::new(service_account, config.notification_timeout_millis) {
                Ok(sender) => return Arc::new(sender),
                Err(e) => warn!(
                    "FCM_SERVICE_ACCOUNT is not a valid service account, falling back to logging notifications. Error: {:?}",
                    e
                ),
            }
        }
        None => info!("No push provider configured. Notifications will only be logged."),
    }
    Arc::new(LogOnlyNotificationSender)
}

const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> CampusContext {
    // cargo run inmemory
    let inmemory_arg_set = std::env::args().nth(1).map_or(false, |arg| arg == "inmemory");
    if inmemory_arg_set {
        info!("Inmemory argument provided. Going to use inmemory infra.");
        return CampusContext::create_inmemory();
    }

    match std::env::var(PSQL_CONNECTION_STRING) {
        Ok(postgres_connection_string) => {
            info!("{} env var was provided. Going to use postgres.", PSQL_CONNECTION_STRING);
            CampusContext::create(ContextParams {
                postgres_connection_string,
            })
            .await
        }
        Err(_) => {
            warn!(
                "{} env var was not provided. Going to use inmemory infra, reminder jobs will not survive a restart.",
                PSQL_CONNECTION_STRING
            );
            CampusContext::create_inmemory()
        }
    }
}

pub async fn run_migration() -> Result<(), MigrateError> {
    let connection_string = match std::env::var(PSQL_CONNECTION_STRING) {
        Ok(connection_string) => connection_string,
        // Nothing to migrate for the inmemory infra
        Err(_) => return Ok(()),
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .expect("TO CONNECT TO POSTGRES");

    sqlx::migrate!().run(&pool).await
}
