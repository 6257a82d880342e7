use super::IClubRepo;
use crate::repos::shared::inmemory_repo::*;
use campus_domain::{Club, ID};

pub struct InMemoryClubRepo {
    clubs: std::sync::Mutex<Vec<Club>>,
}

impl InMemoryClubRepo {
    pub fn new() -> Self {
        Self {
            clubs: std::sync::Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IClubRepo for InMemoryClubRepo {
    async fn insert(&self, club: &Club) -> anyhow::Result<()> {
        insert(club, &self.clubs);
        Ok(())
    }

    async fn delete(&self, club_id: &ID) -> anyhow::Result<Option<Club>> {
        Ok(delete(club_id, &self.clubs))
    }

    async fn find(&self, club_id: &ID) -> anyhow::Result<Option<Club>> {
        Ok(find(club_id, &self.clubs))
    }

    async fn add_follower(&self, club_id: &ID, user_id: &ID) -> anyhow::Result<()> {
        update_many(&self.clubs, |c| c.id == *club_id, |c| c.add_follower(user_id));
        Ok(())
    }

    async fn remove_follower(&self, club_id: &ID, user_id: &ID) -> anyhow::Result<()> {
        update_many(&self.clubs, |c| c.id == *club_id, |c| c.remove_follower(user_id));
        Ok(())
    }
}
