//! JIRA users.
//!
//! Users are identified by login name. [`UsersList`] holds a set of users
//! without duplicate logins.

use std::fmt;

use serde_json::Value;
use tracing::debug;

use super::group::Group;
use crate::api::types::{decode, UserInfo};
use crate::api::Client;
use crate::error::{Error, Result};

pub const AVATAR_L: &str = "48x48";
pub const AVATAR_M: &str = "32x32";
pub const AVATAR_S: &str = "24x24";
pub const AVATAR_XS: &str = "16x16";

/// A JIRA user, identified by login.
#[derive(Debug, Clone)]
pub struct User {
    client: Client,
    name: String,
    original: Option<UserInfo>,
    expanded: Vec<String>,
    groups: Option<Vec<Group>>,
}

impl User {
    /// Wrap a user by login. Nothing is requested until a getter needs it.
    pub fn new(client: &Client, name: &str) -> Self {
        Self {
            client: client.clone(),
            name: name.to_string(),
            original: None,
            expanded: Vec::new(),
            groups: None,
        }
    }

    /// Wrap already loaded user data. JIRA Cloud users have no login, their
    /// account id is used instead.
    pub fn from_info(client: &Client, info: UserInfo) -> Self {
        let name = info.login().unwrap_or_default().to_string();
        let mut user = Self::new(client, &name);
        user.original = Some(info);
        user
    }

    pub(crate) fn from_value(client: &Client, value: Value) -> Result<Self> {
        Ok(Self::from_info(client, decode(value)?))
    }

    /// Load a user by login.
    pub async fn get(client: &Client, name: &str) -> Result<Self> {
        let mut user = Self::new(client, name);
        user.load(&[]).await?;
        Ok(user)
    }

    /// Users whose login, name or email match `pattern`.
    pub async fn search(client: &Client, pattern: &str) -> Result<Vec<Self>> {
        client
            .user()
            .search(pattern, 0, None, true, false)
            .await?
            .into_iter()
            .map(|info| Self::from_value(client, info))
            .collect()
    }

    /// Find the user with exactly this email.
    pub async fn by_email(client: &Client, email: &str) -> Result<Self> {
        let found = client
            .user()
            .search(email, 0, None, true, false)
            .await?
            .into_iter()
            .find(|info| info.get("emailAddress").and_then(Value::as_str) == Some(email));

        match found {
            Some(info) => Self::from_value(client, info),
            None => Err(Error::user(format!(
                "User with email '{}' not found in Jira",
                email
            ))),
        }
    }

    async fn load(&mut self, expand: &[&str]) -> Result<&UserInfo> {
        let mut new_expand = false;
        for item in expand {
            if !self.expanded.iter().any(|e| e == item) {
                self.expanded.push(item.to_string());
                new_expand = true;
            }
        }

        let info = match self.original.take() {
            Some(info) if !new_expand => info,
            _ => {
                let expand: Vec<&str> = self.expanded.iter().map(String::as_str).collect();
                let value = self.client.user().get(&self.name, &expand, true).await?;
                self.groups = None;
                decode(value)?
            }
        };
        Ok(self.original.insert(info))
    }

    /// Forget loaded data.
    pub fn drop_cache(&mut self) {
        self.original = None;
        self.groups = None;
    }

    /// Loaded user data, if any.
    pub fn info(&self) -> Option<&UserInfo> {
        self.original.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn key(&mut self) -> Result<String> {
        Ok(self.load(&[]).await?.key.clone().unwrap_or_default())
    }

    pub async fn display_name(&mut self) -> Result<String> {
        Ok(self.load(&[]).await?.display_name.clone())
    }

    /// Email address. Reloads the user when it came without one.
    pub async fn email(&mut self) -> Result<String> {
        if self
            .original
            .as_ref()
            .is_some_and(|info| info.email_address.is_none())
        {
            debug!(user = %self.name, "Email missing in loaded data, reloading user");
            self.original = None;
        }
        Ok(self.load(&[]).await?.email_address.clone().unwrap_or_default())
    }

    pub async fn is_active(&mut self) -> Result<bool> {
        Ok(self.load(&[]).await?.active)
    }

    /// Avatar URL for a size such as [`AVATAR_M`].
    pub async fn avatar_url(&mut self, size: &str) -> Result<Option<String>> {
        Ok(self.load(&[]).await?.avatar_urls.get(size).cloned())
    }

    /// Groups the user belongs to.
    pub async fn groups(&mut self) -> Result<&[Group]> {
        if self.groups.is_none() {
            let client = self.client.clone();
            let info = self.load(&["groups"]).await?;
            let groups: Vec<Group> = info
                .groups
                .as_ref()
                .map(|g| g.items.iter().map(|item| Group::from_info(&client, item.clone())).collect())
                .unwrap_or_default();
            self.groups = Some(groups);
        }
        Ok(self.groups.as_deref().unwrap_or_default())
    }

    /// Check if the user is a member of any of `group_names`.
    pub async fn is_member_of(&mut self, group_names: &[&str]) -> Result<bool> {
        Ok(self
            .groups()
            .await?
            .iter()
            .any(|group| group_names.contains(&group.name())))
    }

    /// Start or stop watching an issue.
    pub async fn watch_issue(&self, issue_key: &str, watch: bool) -> Result<()> {
        let watchers = self.client.issue().watchers();
        if watch {
            watchers.add(issue_key, &self.name).await?;
        } else {
            watchers.remove(issue_key, &self.name).await?;
        }
        Ok(())
    }

    /// Assign an issue to this user.
    pub async fn assign(&self, issue_key: &str) -> Result<()> {
        self.client.issue().assign(issue_key, Some(&self.name)).await?;
        Ok(())
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = self
            .original
            .as_ref()
            .map(|info| info.display_name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.name);
        write!(f, "{} ({})", display_name, self.name)
    }
}

/// Users indexed by login and by email.
#[derive(Debug, Clone, Default)]
pub struct UsersList {
    users: Vec<User>,
}

impl UsersList {
    pub fn new(users: Vec<User>) -> Self {
        let mut list = Self::default();
        list.add_users(users);
        list
    }

    pub(crate) fn from_values(client: &Client, values: Vec<Value>) -> Result<Self> {
        let users = values
            .into_iter()
            .map(|value| User::from_value(client, value))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(users))
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Add users, replacing entries with the same login.
    pub fn add_users(&mut self, users: impl IntoIterator<Item = User>) {
        for user in users {
            match self.users.iter_mut().find(|u| u.name() == user.name()) {
                Some(existing) => *existing = user,
                None => self.users.push(user),
            }
        }
    }

    pub fn remove_users(&mut self, names: &[&str]) {
        self.users.retain(|u| !names.contains(&u.name()));
    }

    pub fn clear(&mut self) {
        self.users.clear();
    }

    pub fn get(&self, name: &str) -> Option<&User> {
        self.users.iter().find(|u| u.name() == name)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Check by email among the users loaded with one.
    pub fn has_email(&self, email: &str) -> bool {
        self.users.iter().any(|u| {
            u.info()
                .and_then(|info| info.email_address.as_deref())
                == Some(email)
        })
    }
}
