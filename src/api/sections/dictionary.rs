//! Memoized read-only dictionaries: issue types, priorities, resolutions,
//! statuses, status categories and security levels.

use std::sync::Mutex;

use serde_json::Value;
use tracing::trace;

use super::into_list;
use crate::api::client::{lock, Memo};
use crate::api::{Client, Result};

/// A memoized dictionary endpoint (`<api>` and `<api>/{id}`).
#[derive(Debug, Clone, Copy)]
pub struct DictionarySection<'a> {
    client: &'a Client,
    api: &'static str,
    memo: &'a Mutex<Memo>,
}

impl<'a> DictionarySection<'a> {
    pub(crate) fn new(client: &'a Client, api: &'static str, memo: &'a Mutex<Memo>) -> Self {
        Self { client, api, memo }
    }

    /// Get one item, from the memo unless `reload_cache` is set.
    pub async fn get(&self, id: u64, reload_cache: bool) -> Result<Value> {
        if !reload_cache {
            if let Some(item) = lock(self.memo).get(id) {
                trace!(api = self.api, id, "Memo hit");
                return Ok(item);
            }
        }

        let item = self
            .client
            .raw()
            .get(&format!("{}/{}", self.api, id), &Value::Null)
            .await?;
        lock(self.memo).insert(item.clone());
        Ok(item)
    }

    /// List all items, from the memo unless `reload_cache` is set.
    pub async fn list(&self, reload_cache: bool) -> Result<Vec<Value>> {
        if !reload_cache {
            if let Some(all) = lock(self.memo).all() {
                return Ok(all);
            }
        }

        let items = into_list(self.client.raw().get(self.api, &Value::Null).await?);
        lock(self.memo).fill(items.clone());
        Ok(items)
    }

    /// Find an item by its name.
    pub async fn search_by_name(&self, name: &str, case_sensitive: bool) -> Result<Option<Value>> {
        let items = self.list(false).await?;
        Ok(items.into_iter().find(|item| {
            let item_name = item.get("name").and_then(Value::as_str).unwrap_or_default();
            if case_sensitive {
                item_name == name
            } else {
                item_name.to_lowercase() == name.to_lowercase()
            }
        }))
    }
}

/// Issue security levels (`securitylevel/{id}`), memoized.
#[derive(Debug, Clone, Copy)]
pub struct SecurityLevelSection<'a> {
    client: &'a Client,
}

impl<'a> SecurityLevelSection<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: u64, reload_cache: bool) -> Result<Value> {
        let memo = &self.client.memos().security_levels;
        if !reload_cache {
            if let Some(item) = lock(memo).get(id) {
                return Ok(item);
            }
        }

        let item = self
            .client
            .raw()
            .get(&format!("securitylevel/{}", id), &Value::Null)
            .await?;
        lock(memo).insert(item.clone());
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::client::tests::{api_path, test_client};
    use serde_json::json;

    #[tokio::test]
    async fn test_list_is_memoized() {
        let (client, transport) = test_client();
        transport.push_json(
            200,
            json!([{"id": "1", "name": "Highest"}, {"id": "3", "name": "Medium"}]),
        );

        let first = client.priority().list(false).await.unwrap();
        let second = client.priority().list(false).await.unwrap();
        let item = client.priority().get(3, false).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second, first);
        assert_eq!(item["name"], "Medium");
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(api_path(&transport.sent()[0].url), "priority");
    }

    #[tokio::test]
    async fn test_reload_cache_forces_request() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({"id": "10000", "name": "Done"}));
        transport.push_json(200, json!({"id": "10000", "name": "Closed"}));

        client.status().get(10000, false).await.unwrap();
        let cached = client.status().get(10000, false).await.unwrap();
        assert_eq!(cached["name"], "Done");

        let reloaded = client.status().get(10000, true).await.unwrap();
        assert_eq!(reloaded["name"], "Closed");
        assert_eq!(transport.sent().len(), 2);
        assert_eq!(api_path(&transport.sent()[0].url), "status/10000");
    }

    #[tokio::test]
    async fn test_memos_are_shared_between_clones() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({"id": "1", "name": "Fixed"}));

        client.resolution().get(1, false).await.unwrap();
        let other = client.clone();
        other.resolution().get(1, false).await.unwrap();
        assert_eq!(transport.sent().len(), 1);

        other.clear_memos();
        transport.push_json(200, json!({"id": "1", "name": "Fixed"}));
        client.resolution().get(1, false).await.unwrap();
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_search_by_name() {
        let (client, transport) = test_client();
        transport.push_json(200, json!([{"id": "1", "name": "Bug"}, {"id": "2", "name": "Task"}]));

        let issue_type = client.issue_type();
        assert_eq!(issue_type.search_by_name("Bug", true).await.unwrap().unwrap()["id"], "1");
        assert!(issue_type.search_by_name("bug", true).await.unwrap().is_none());
        assert_eq!(issue_type.search_by_name("TASK", false).await.unwrap().unwrap()["id"], "2");
        assert_eq!(api_path(&transport.sent()[0].url), "issuetype");
    }

    #[tokio::test]
    async fn test_security_level() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({"id": "10100", "name": "Internal"}));

        let level = client.security_level().get(10100, false).await.unwrap();
        client.security_level().get(10100, false).await.unwrap();
        assert_eq!(level["name"], "Internal");
        assert_eq!(api_path(&transport.sent()[0].url), "securitylevel/10100");
        assert_eq!(transport.sent().len(), 1);
    }
}
