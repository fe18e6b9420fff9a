//! `field` resource: system and custom field definitions.

use serde_json::Value;

use super::into_list;
use crate::api::{Client, Result};

/// Field definitions (`field`).
#[derive(Debug, Clone, Copy)]
pub struct FieldSection<'a> {
    client: &'a Client,
}

impl<'a> FieldSection<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// All system and custom fields.
    pub async fn list(&self) -> Result<Vec<Value>> {
        Ok(into_list(self.client.raw().get("field", &Value::Null).await?))
    }

    /// Definition of one field, by id (e.g. `customfield_10010`).
    pub async fn get(&self, id: &str) -> Result<Option<Value>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|field| field.get("id").and_then(Value::as_str) == Some(id)))
    }

    /// Custom fields only.
    pub async fn custom(&self) -> Result<Vec<Value>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|field| field.get("custom").and_then(Value::as_bool) == Some(true))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::client::tests::test_client;
    use serde_json::json;

    fn fields() -> serde_json::Value {
        json!([
            {"id": "summary", "name": "Summary", "custom": false},
            {"id": "customfield_10010", "name": "Team", "custom": true}
        ])
    }

    #[tokio::test]
    async fn test_get_and_custom() {
        let (client, transport) = test_client();
        transport.push_json(200, fields());
        transport.push_json(200, fields());
        transport.push_json(200, fields());

        let team = client.field().get("customfield_10010").await.unwrap().unwrap();
        assert_eq!(team["name"], "Team");
        assert!(client.field().get("missing").await.unwrap().is_none());

        let custom = client.field().custom().await.unwrap();
        assert_eq!(custom.len(), 1);
        assert_eq!(custom[0]["id"], "customfield_10010");
    }
}
