use super::IEventRepo;
use campus_domain::{Event, ID};
use sqlx::{types::Uuid, FromRow, PgPool};

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRaw {
    event_uid: Uuid,
    club_uid: Option<Uuid>,
    title: String,
    start_ts: i64,
}

impl From<EventRaw> for Event {
    fn from(raw: EventRaw) -> Self {
        Self {
            id: raw.event_uid.into(),
            title: raw.title,
            start_ts: raw.start_ts,
            club_id: raw.club_uid.map(|id| id.into()),
        }
    }
}

#[async_trait::async_trait]
impl IEventRepo for PostgresEventRepo {
    async fn insert(&self, e: &Event) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events(event_uid, club_uid, title, start_ts)
            VALUES($1, $2, $3, $4)
            "#,
        )
        .bind(e.id.inner_ref())
        .bind(e.club_id.map(|id| id.inner()))
        .bind(&e.title)
        .bind(e.start_ts)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, e: &Event) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE events
            SET club_uid = $2,
            title = $3,
            start_ts = $4
            WHERE event_uid = $1
            "#,
        )
        .bind(e.id.inner_ref())
        .bind(e.club_id.map(|id| id.inner()))
        .bind(&e.title)
        .bind(e.start_ts)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, event_id: &ID) -> anyhow::Result<Option<Event>> {
        let event = sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT * FROM events AS e
            WHERE e.event_uid = $1
            "#,
        )
        .bind(event_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(event.map(|e| e.into()))
    }

    async fn delete(&self, event_id: &ID) -> anyhow::Result<Option<Event>> {
        let event = sqlx::query_as::<_, EventRaw>(
            r#"
            DELETE FROM events AS e
            WHERE e.event_uid = $1
            RETURNING *
            "#,
        )
        .bind(event_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(event.map(|e| e.into()))
    }
}
