//! Watchers of an issue.

use super::user::{User, UsersList};
use crate::api::Client;
use crate::error::Result;

/// Watchers of one issue.
///
/// Changes to the list are sent to JIRA right away.
#[derive(Debug, Clone)]
pub struct WatchersList {
    client: Client,
    issue_key: String,
    users: Option<UsersList>,
}

impl WatchersList {
    pub fn new(client: &Client, issue_key: &str) -> Self {
        Self {
            client: client.clone(),
            issue_key: issue_key.to_string(),
            users: None,
        }
    }

    pub fn issue_key(&self) -> &str {
        &self.issue_key
    }

    async fn list(&mut self) -> Result<&mut UsersList> {
        let users = match self.users.take() {
            Some(users) => users,
            None => {
                let values = self.client.issue().watchers().list(&self.issue_key).await?;
                UsersList::from_values(&self.client, values)?
            }
        };
        Ok(self.users.insert(users))
    }

    /// Forget the loaded watchers.
    pub fn drop_cache(&mut self) {
        self.users = None;
    }

    pub async fn users(&mut self) -> Result<&[User]> {
        Ok(self.list().await?.users())
    }

    pub async fn has_name(&mut self, login: &str) -> Result<bool> {
        Ok(self.list().await?.has_name(login))
    }

    /// Make each user watch the issue.
    pub async fn add_users(&mut self, users: Vec<User>) -> Result<()> {
        self.list().await?;
        for user in users {
            user.watch_issue(&self.issue_key, true).await?;
            if let Some(list) = self.users.as_mut() {
                list.add_users([user]);
            }
        }
        Ok(())
    }

    pub async fn add_users_by_name(&mut self, logins: &[&str]) -> Result<()> {
        let users = logins.iter().map(|login| User::new(&self.client, login)).collect();
        self.add_users(users).await
    }

    /// Stop the users from watching the issue.
    pub async fn remove_users_by_name(&mut self, logins: &[&str]) -> Result<()> {
        self.list().await?;
        for login in logins {
            User::new(&self.client, login)
                .watch_issue(&self.issue_key, false)
                .await?;
            if let Some(list) = self.users.as_mut() {
                list.remove_users(&[*login]);
            }
        }
        Ok(())
    }

    pub async fn remove_users(&mut self, users: &[User]) -> Result<()> {
        let logins: Vec<&str> = users.iter().map(User::name).collect();
        self.remove_users_by_name(&logins).await
    }

    /// Remove every watcher.
    pub async fn clear(&mut self) -> Result<()> {
        let logins: Vec<String> = self
            .list()
            .await?
            .users()
            .iter()
            .map(|u| u.name().to_string())
            .collect();
        let logins: Vec<&str> = logins.iter().map(String::as_str).collect();
        self.remove_users_by_name(&logins).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::{api_path, test_client};
    use crate::api::transport::{Payload, RequestMethod};
    use serde_json::json;

    #[tokio::test]
    async fn test_add_and_remove_mirror_to_api() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({"watchers": [{"name": "jdoe"}]}));
        transport.push(204, "", "");
        transport.push(204, "", "");

        let mut watchers = WatchersList::new(&client, "TEST-1");
        assert!(transport.sent().is_empty());

        watchers.add_users_by_name(&["asmith"]).await.unwrap();
        assert!(watchers.has_name("asmith").await.unwrap());
        assert!(watchers.has_name("jdoe").await.unwrap());

        watchers.remove_users_by_name(&["jdoe"]).await.unwrap();
        assert!(!watchers.has_name("jdoe").await.unwrap());

        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(api_path(&sent[0].url), "issue/TEST-1/watchers");
        assert_eq!(sent[1].method, RequestMethod::Post);
        assert_eq!(sent[1].payload, Payload::Json(json!("asmith")));
        assert_eq!(sent[2].method, RequestMethod::Delete);
        assert_eq!(api_path(&sent[2].url), "issue/TEST-1/watchers?username=jdoe");
    }

    #[tokio::test]
    async fn test_clear_removes_everyone() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({"watchers": [{"name": "jdoe"}, {"name": "asmith"}]}));
        transport.push(204, "", "");
        transport.push(204, "", "");

        let mut watchers = WatchersList::new(&client, "TEST-1");
        watchers.clear().await.unwrap();

        assert!(watchers.users().await.unwrap().is_empty());
        assert_eq!(transport.sent().len(), 3);
    }
}
