//! `user` resource: lookup, search and administration.

use serde_json::{json, Map, Value};

use super::{into_list, join_list};
use crate::api::client::lock;
use crate::api::{Client, Result};

/// Applications granted to users created without an explicit list.
const DEFAULT_APPLICATIONS: [&str; 1] = ["jira-software"];

/// Default page size of user searches.
const SEARCH_MAX_RESULTS: u32 = 50;

/// Operations on users. Fetched users are memoized by key and by name.
#[derive(Debug, Clone, Copy)]
pub struct UserSection<'a> {
    client: &'a Client,
}

impl<'a> UserSection<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create a user.
    pub async fn create(
        &self,
        name: &str,
        password: &str,
        email: &str,
        display_name: &str,
        applications: Option<&[&str]>,
    ) -> Result<Value> {
        let applications = applications.unwrap_or(&DEFAULT_APPLICATIONS);
        self.client
            .raw()
            .post(
                "user",
                json!({
                    "name": name,
                    "password": password,
                    "emailAddress": email,
                    "displayName": display_name,
                    "applicationKeys": applications,
                }),
            )
            .await
    }

    /// Get a user by login.
    ///
    /// Served from the memo unless `reload_cache` is set or extra data is
    /// requested with `expand`.
    pub async fn get(&self, name: &str, expand: &[&str], reload_cache: bool) -> Result<Value> {
        let memo = &self.client.memos().users;
        if !reload_cache && expand.is_empty() {
            if let Some(user) = lock(memo).by_name.get(name).cloned() {
                return Ok(user);
            }
        }

        let user = self
            .client
            .raw()
            .get("user", &json!({"username": name, "expand": join_list(expand)}))
            .await?;
        self.remember(&user);
        Ok(user)
    }

    /// Memoized user by key, if it was fetched before.
    pub fn cached_by_key(&self, key: &str) -> Option<Value> {
        lock(&self.client.memos().users).by_key.get(key).cloned()
    }

    fn remember(&self, user: &Value) {
        let mut memo = lock(&self.client.memos().users);
        if let Some(key) = user.get("key").and_then(Value::as_str) {
            memo.by_key.insert(key.to_string(), user.clone());
        }
        if let Some(name) = user.get("name").and_then(Value::as_str) {
            memo.by_name.insert(name.to_string(), user.clone());
        }
    }

    /// Delete a user.
    pub async fn remove(&self, name: &str) -> Result<()> {
        self.client
            .raw()
            .delete("user", &json!({"username": name}))
            .await?;

        let mut memo = lock(&self.client.memos().users);
        if let Some(user) = memo.by_name.remove(name) {
            if let Some(key) = user.get("key").and_then(Value::as_str) {
                memo.by_key.remove(key);
            }
        }
        Ok(())
    }

    /// Find users whose login, name or email match `pattern`.
    pub async fn search(
        &self,
        pattern: &str,
        start_at: u32,
        max_results: Option<u32>,
        include_active: bool,
        include_inactive: bool,
    ) -> Result<Vec<Value>> {
        let answer = self
            .client
            .raw()
            .get(
                "user/search",
                &json!({
                    "username": pattern,
                    "startAt": start_at,
                    "maxResults": max_results.unwrap_or(SEARCH_MAX_RESULTS),
                    "includeActive": include_active,
                    "includeInactive": include_inactive,
                }),
            )
            .await?;
        Ok(into_list(answer))
    }

    /// Change user properties. Only the given values are sent.
    pub async fn update(
        &self,
        name: &str,
        email: Option<&str>,
        display_name: Option<&str>,
        applications: Option<&[&str]>,
        new_name: Option<&str>,
    ) -> Result<Value> {
        let mut args = Map::new();
        if let Some(email) = email {
            args.insert("emailAddress".into(), json!(email));
        }
        if let Some(display_name) = display_name {
            args.insert("displayName".into(), json!(display_name));
        }
        if let Some(applications) = applications {
            args.insert("applicationKeys".into(), json!(applications));
        }
        if let Some(new_name) = new_name {
            args.insert("name".into(), json!(new_name));
        }

        let updated = self
            .client
            .raw()
            .put(
                &format!("user?username={}", urlencoding::encode(name)),
                Value::Object(args),
            )
            .await?;

        lock(&self.client.memos().users).by_name.remove(name);
        if updated.is_object() {
            self.remember(&updated);
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::client::tests::{api_path, test_client};
    use crate::api::transport::{Payload, RequestMethod};
    use serde_json::json;

    #[tokio::test]
    async fn test_create_uses_default_applications() {
        let (client, transport) = test_client();
        transport.push_json(201, json!({"name": "jdoe"}));

        client
            .user()
            .create("jdoe", "secret", "jdoe@example.com", "John Doe", None)
            .await
            .unwrap();

        assert_eq!(
            transport.sent()[0].payload,
            Payload::Json(json!({
                "name": "jdoe",
                "password": "secret",
                "emailAddress": "jdoe@example.com",
                "displayName": "John Doe",
                "applicationKeys": ["jira-software"],
            }))
        );
    }

    #[tokio::test]
    async fn test_get_is_memoized_by_name_and_key() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({"key": "jdoe1", "name": "jdoe"}));
        transport.push_json(200, json!({"key": "jdoe1", "name": "jdoe", "groups": {}}));

        client.user().get("jdoe", &[], false).await.unwrap();
        client.user().get("jdoe", &[], false).await.unwrap();
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(client.user().cached_by_key("jdoe1").unwrap()["name"], "jdoe");

        client.user().get("jdoe", &["groups"], false).await.unwrap();
        assert_eq!(transport.sent().len(), 2);
        assert!(transport.sent()[1].url.contains("expand=groups"));
    }

    #[tokio::test]
    async fn test_remove_forgets_user() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({"key": "jdoe1", "name": "jdoe"}));
        transport.push(204, "", "");

        client.user().get("jdoe", &[], false).await.unwrap();
        client.user().remove("jdoe").await.unwrap();

        assert_eq!(transport.sent()[1].method, RequestMethod::Delete);
        assert_eq!(api_path(&transport.sent()[1].url), "user?username=jdoe");
        assert!(client.user().cached_by_key("jdoe1").is_none());
    }

    #[tokio::test]
    async fn test_search_arguments() {
        let (client, transport) = test_client();
        transport.push_json(200, json!([{"name": "jdoe"}]));

        let users = client.user().search("jd", 0, None, true, false).await.unwrap();
        assert_eq!(users.len(), 1);

        let sent = transport.sent();
        let url = &sent[0].url;
        assert!(url.contains("user/search?"));
        assert!(url.contains("username=jd"));
        assert!(url.contains("maxResults=50"));
        assert!(url.contains("includeActive=true"));
        assert!(url.contains("includeInactive=false"));
    }

    #[tokio::test]
    async fn test_update_sends_only_given_values() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({"key": "jdoe1", "name": "jdoe", "displayName": "J. Doe"}));

        client
            .user()
            .update("jdoe", None, Some("J. Doe"), None, None)
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(api_path(&sent[0].url), "user?username=jdoe");
        assert_eq!(sent[0].payload, Payload::Json(json!({"displayName": "J. Doe"})));
    }
}
