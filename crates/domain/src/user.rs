use crate::shared::entity::{Entity, ID};

/// A `User` of the campus app. Reminders are delivered to the device
/// registered through `device_token`, a user without one is never notified.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: ID,
    pub name: String,
    pub email: String,
    /// Push notification token of the users device
    pub device_token: Option<String>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Default::default(),
            name: name.into(),
            email: email.into(),
            device_token: None,
        }
    }

    pub fn with_device_token(mut self, token: impl Into<String>) -> Self {
        self.device_token = Some(token.into());
        self
    }
}

impl Entity for User {
    fn id(&self) -> &ID {
        &self.id
    }
}
