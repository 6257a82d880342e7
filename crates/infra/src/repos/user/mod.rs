mod inmemory;
mod postgres;

use campus_domain::{User, ID};
pub use inmemory::InMemoryUserRepo;
pub use postgres::PostgresUserRepo;

#[async_trait::async_trait]
pub trait IUserRepo: Send + Sync {
    async fn insert(&self, user: &User) -> anyhow::Result<()>;
    async fn save(&self, user: &User) -> anyhow::Result<()>;
    async fn delete(&self, user_id: &ID) -> anyhow::Result<Option<User>>;
    async fn find(&self, user_id: &ID) -> anyhow::Result<Option<User>>;
    /// Missing ids are ignored
    async fn find_many(&self, user_ids: &[ID]) -> anyhow::Result<Vec<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Every registered device token, one per `User` that has one
    async fn find_device_tokens(&self) -> anyhow::Result<Vec<String>>;
    /// Removes the device token of the `User`, but only if it still is `token`.
    /// Used when the push provider reports the token as unregistered.
    async fn clear_device_token(&self, user_id: &ID, token: &str) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn crud() {
        let repo = InMemoryUserRepo::new();
        let anna = User::new("Anna", "anna@campus.edu").with_device_token("t1");
        let bob = User::new("Bob", "bob@campus.edu");
        repo.insert(&anna).await.unwrap();
        repo.insert(&bob).await.unwrap();

        let found = repo.find_by_email("anna@campus.edu").await.unwrap();
        assert_eq!(found, Some(anna.clone()));

        assert_eq!(
            repo.find_device_tokens().await.unwrap(),
            vec!["t1".to_string()]
        );

        let many = repo
            .find_many(&[anna.id, bob.id, ID::new()])
            .await
            .unwrap();
        assert_eq!(many.len(), 2);

        // A stale token does not clear a newer one
        repo.clear_device_token(&anna.id, "t0").await.unwrap();
        assert_eq!(
            repo.find(&anna.id).await.unwrap().unwrap().device_token,
            Some("t1".to_string())
        );
        repo.clear_device_token(&anna.id, "t1").await.unwrap();
        assert_eq!(repo.find(&anna.id).await.unwrap().unwrap().device_token, None);
        assert!(repo.find_device_tokens().await.unwrap().is_empty());

        assert_eq!(repo.delete(&bob.id).await.unwrap(), Some(bob.clone()));
        assert!(repo.find(&bob.id).await.unwrap().is_none());
    }
}
