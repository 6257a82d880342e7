mod club;
mod event;
mod reminder_job;
mod shared;
mod user;

pub use club::IClubRepo;
use club::{InMemoryClubRepo, PostgresClubRepo};
pub use event::IEventRepo;
use event::{InMemoryEventRepo, PostgresEventRepo};
pub use reminder_job::IReminderJobRepo;
use reminder_job::{InMemoryReminderJobRepo, PostgresReminderJobRepo};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
pub use user::IUserRepo;
use user::{InMemoryUserRepo, PostgresUserRepo};

#[derive(Clone)]
pub struct Repos {
    pub users: Arc<dyn IUserRepo>,
    pub clubs: Arc<dyn IClubRepo>,
    pub events: Arc<dyn IEventRepo>,
    pub reminder_jobs: Arc<dyn IReminderJobRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");

        Ok(Self {
            users: Arc::new(PostgresUserRepo::new(pool.clone())),
            clubs: Arc::new(PostgresClubRepo::new(pool.clone())),
            events: Arc::new(PostgresEventRepo::new(pool.clone())),
            reminder_jobs: Arc::new(PostgresReminderJobRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepo::new()),
            clubs: Arc::new(InMemoryClubRepo::new()),
            events: Arc::new(InMemoryEventRepo::new()),
            reminder_jobs: Arc::new(InMemoryReminderJobRepo::new()),
        }
    }
}
