use super::IUserRepo;
use crate::repos::shared::inmemory_repo::*;
use campus_domain::{User, ID};

pub struct InMemoryUserRepo {
    users: std::sync::Mutex<Vec<User>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self {
            users: std::sync::Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IUserRepo for InMemoryUserRepo {
    async fn insert(&self, user: &User) -> anyhow::Result<()> {
        insert(user, &self.users);
        Ok(())
    }

    async fn save(&self, user: &User) -> anyhow::Result<()> {
        save(user, &self.users);
        Ok(())
    }

    async fn delete(&self, user_id: &ID) -> anyhow::Result<Option<User>> {
        Ok(delete(user_id, &self.users))
    }

    async fn find(&self, user_id: &ID) -> anyhow::Result<Option<User>> {
        Ok(find(user_id, &self.users))
    }

    async fn find_many(&self, user_ids: &[ID]) -> anyhow::Result<Vec<User>> {
        Ok(find_by(&self.users, |u| user_ids.contains(&u.id)))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(find_by(&self.users, |u| u.email == email).into_iter().next())
    }

    async fn find_device_tokens(&self) -> anyhow::Result<Vec<String>> {
        Ok(find_by(&self.users, |u| u.device_token.is_some())
            .into_iter()
            .filter_map(|u| u.device_token)
            .collect())
    }

    async fn clear_device_token(&self, user_id: &ID, token: &str) -> anyhow::Result<()> {
        update_many(
            &self.users,
            |u| u.id == *user_id && u.device_token.as_deref() == Some(token),
            |u| u.device_token = None,
        );
        Ok(())
    }
}
