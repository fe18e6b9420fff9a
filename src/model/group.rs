//! User groups and their members.

use std::fmt;

use super::user::User;
use crate::api::types::GroupInfo;
use crate::api::Client;
use crate::error::Result;

/// A JIRA user group.
#[derive(Debug, Clone)]
pub struct Group {
    client: Client,
    name: String,
    users: Option<Vec<User>>,
}

impl Group {
    pub fn new(client: &Client, name: &str) -> Self {
        Self {
            client: client.clone(),
            name: name.to_string(),
            users: None,
        }
    }

    pub fn from_info(client: &Client, info: GroupInfo) -> Self {
        Self::new(client, &info.name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active members, loaded on first call.
    pub async fn users(&mut self) -> Result<&[User]> {
        let users = match self.users.take() {
            Some(users) => users,
            None => self
                .client
                .group()
                .list_all_users(&self.name, false)
                .await?
                .into_iter()
                .map(|value| User::from_value(&self.client, value))
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(self.users.insert(users))
    }

    pub async fn add_user(&mut self, login: &str) -> Result<()> {
        self.client.group().add_user(&self.name, login).await?;
        self.users = None;
        Ok(())
    }

    pub async fn remove_user(&mut self, login: &str) -> Result<()> {
        self.client.group().remove_user(&self.name, login).await?;
        self.users = None;
        Ok(())
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
