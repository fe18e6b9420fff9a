//! `issueLinkType` resource.

use serde_json::{json, Map, Value};

use super::take_list;
use crate::api::client::lock;
use crate::api::{Client, Result};

/// Issue link types, memoized.
#[derive(Debug, Clone, Copy)]
pub struct IssueLinkTypeSection<'a> {
    client: &'a Client,
}

impl<'a> IssueLinkTypeSection<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, name: &str, inward: &str, outward: &str) -> Result<Value> {
        let created = self
            .client
            .raw()
            .post(
                "issueLinkType",
                json!({"name": name, "inward": inward, "outward": outward}),
            )
            .await?;
        lock(&self.client.memos().link_types).insert(created.clone());
        Ok(created)
    }

    pub async fn get(&self, id: u64, reload_cache: bool) -> Result<Value> {
        let memo = &self.client.memos().link_types;
        if !reload_cache {
            if let Some(item) = lock(memo).get(id) {
                return Ok(item);
            }
        }

        let item = self
            .client
            .raw()
            .get(&format!("issueLinkType/{}", id), &Value::Null)
            .await?;
        lock(memo).insert(item.clone());
        Ok(item)
    }

    pub async fn list(&self, reload_cache: bool) -> Result<Vec<Value>> {
        let memo = &self.client.memos().link_types;
        if !reload_cache {
            if let Some(all) = lock(memo).all() {
                return Ok(all);
            }
        }

        let answer = self.client.raw().get("issueLinkType", &Value::Null).await?;
        let items = take_list(answer, "issueLinkTypes");
        lock(memo).fill(items.clone());
        Ok(items)
    }

    /// Change name, inward or outward description.
    pub async fn update(
        &self,
        id: u64,
        name: Option<&str>,
        inward: Option<&str>,
        outward: Option<&str>,
    ) -> Result<Value> {
        let args: Map<String, Value> = [("name", name), ("inward", inward), ("outward", outward)]
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.to_string(), json!(v))))
            .collect();
        let updated = self
            .client
            .raw()
            .put(&format!("issueLinkType/{}", id), Value::Object(args))
            .await?;
        let mut memo = lock(&self.client.memos().link_types);
        memo.remove(id);
        if updated.is_object() {
            memo.insert(updated.clone());
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client
            .raw()
            .delete(&format!("issueLinkType/{}", id), &Value::Null)
            .await?;
        lock(&self.client.memos().link_types).remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::client::tests::{api_path, test_client};
    use serde_json::json;

    #[tokio::test]
    async fn test_list_and_get_share_memo() {
        let (client, transport) = test_client();
        transport.push_json(
            200,
            json!({"issueLinkTypes": [
                {"id": "10000", "name": "Blocks", "inward": "is blocked by", "outward": "blocks"}
            ]}),
        );

        let types = client.issue_link_type().list(false).await.unwrap();
        let blocks = client.issue_link_type().get(10000, false).await.unwrap();

        assert_eq!(types.len(), 1);
        assert_eq!(blocks["outward"], "blocks");
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(api_path(&transport.sent()[0].url), "issueLinkType");
    }

    #[tokio::test]
    async fn test_delete_drops_memo() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({"id": "5", "name": "Duplicate"}));
        transport.push(204, "", "");
        transport.push_json(200, json!({"id": "5", "name": "Duplicate"}));

        client.issue_link_type().get(5, false).await.unwrap();
        client.issue_link_type().delete(5).await.unwrap();
        client.issue_link_type().get(5, false).await.unwrap();
        assert_eq!(transport.sent().len(), 3);
    }
}
