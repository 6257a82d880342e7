use super::IClubRepo;
use campus_domain::{Club, ID};
use sqlx::{types::Uuid, FromRow, PgPool};

pub struct PostgresClubRepo {
    pool: PgPool,
}

impl PostgresClubRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ClubRaw {
    club_uid: Uuid,
    name: String,
    followers: Vec<Uuid>,
}

impl From<ClubRaw> for Club {
    fn from(raw: ClubRaw) -> Self {
        Self {
            id: raw.club_uid.into(),
            name: raw.name,
            followers: raw.followers.into_iter().map(|id| id.into()).collect(),
        }
    }
}

#[async_trait::async_trait]
impl IClubRepo for PostgresClubRepo {
    async fn insert(&self, club: &Club) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO clubs(club_uid, name)
            VALUES($1, $2)
            "#,
        )
        .bind(club.id.inner_ref())
        .bind(&club.name)
        .execute(&mut *tx)
        .await?;

        for follower in &club.followers {
            sqlx::query(
                r#"
                INSERT INTO club_followers(club_uid, user_uid)
                VALUES($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(club.id.inner_ref())
            .bind(follower.inner_ref())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn delete(&self, club_id: &ID) -> anyhow::Result<Option<Club>> {
        let club = match self.find(club_id).await? {
            Some(club) => club,
            None => return Ok(None),
        };
        // Followers are removed by the cascading foreign key
        sqlx::query(
            r#"
            DELETE FROM clubs AS c
            WHERE c.club_uid = $1
            "#,
        )
        .bind(club_id.inner_ref())
        .execute(&self.pool)
        .await?;

        Ok(Some(club))
    }

    async fn find(&self, club_id: &ID) -> anyhow::Result<Option<Club>> {
        let club = sqlx::query_as::<_, ClubRaw>(
            r#"
            SELECT c.club_uid, c.name,
                COALESCE(array_agg(f.user_uid) FILTER (WHERE f.user_uid IS NOT NULL), '{}') AS followers
            FROM clubs AS c
            LEFT JOIN club_followers AS f ON f.club_uid = c.club_uid
            WHERE c.club_uid = $1
            GROUP BY c.club_uid
            "#,
        )
        .bind(club_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(club.map(|c| c.into()))
    }

    async fn add_follower(&self, club_id: &ID, user_id: &ID) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO club_followers(club_uid, user_uid)
            VALUES($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(club_id.inner_ref())
        .bind(user_id.inner_ref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_follower(&self, club_id: &ID, user_id: &ID) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            DELETE FROM club_followers
            WHERE club_uid = $1 AND user_uid = $2
            "#,
        )
        .bind(club_id.inner_ref())
        .bind(user_id.inner_ref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
