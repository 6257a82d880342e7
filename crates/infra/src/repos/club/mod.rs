mod inmemory;
mod postgres;

use campus_domain::{Club, ID};
pub use inmemory::InMemoryClubRepo;
pub use postgres::PostgresClubRepo;

#[async_trait::async_trait]
pub trait IClubRepo: Send + Sync {
    async fn insert(&self, club: &Club) -> anyhow::Result<()>;
    async fn delete(&self, club_id: &ID) -> anyhow::Result<Option<Club>>;
    /// Finds the `Club` together with its current followers
    async fn find(&self, club_id: &ID) -> anyhow::Result<Option<Club>>;
    async fn add_follower(&self, club_id: &ID, user_id: &ID) -> anyhow::Result<()>;
    async fn remove_follower(&self, club_id: &ID, user_id: &ID) -> anyhow::Result<()>;
}
