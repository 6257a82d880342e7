use crate::shared::entity::{Entity, ID};

#[derive(Debug, Clone, PartialEq)]
pub struct Club {
    pub id: ID,
    pub name: String,
    /// `User`s subscribed to notifications from this `Club`
    pub followers: Vec<ID>,
}

impl Club {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Default::default(),
            name: name.into(),
            followers: Vec::new(),
        }
    }

    pub fn add_follower(&mut self, user_id: &ID) {
        if !self.followers.contains(user_id) {
            self.followers.push(*user_id);
        }
    }

    pub fn remove_follower(&mut self, user_id: &ID) {
        self.followers.retain(|id| id != user_id);
    }

    pub fn has_followers(&self) -> bool {
        !self.followers.is_empty()
    }
}

impl Entity for Club {
    fn id(&self) -> &ID {
        &self.id
    }
}
