//! `version` resource.

use serde_json::{json, Map, Value};

use super::merge_into;
use crate::api::{Client, Result};

/// Operations on project versions.
#[derive(Debug, Clone, Copy)]
pub struct VersionSection<'a> {
    client: &'a Client,
}

impl<'a> VersionSection<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: u64) -> Result<Value> {
        self.client
            .raw()
            .get(&format!("version/{}", id), &Value::Null)
            .await
    }

    /// Create a version in a project given by key or numeric id.
    pub async fn create(
        &self,
        project: &str,
        name: &str,
        fields: Option<Map<String, Value>>,
    ) -> Result<Value> {
        let mut args = Map::new();
        match project.parse::<u64>() {
            Ok(id) => args.insert("projectId".into(), json!(id)),
            Err(_) => args.insert("project".into(), json!(project)),
        };
        args.insert("name".into(), json!(name));
        merge_into(&mut args, fields);

        self.client.raw().post("version", Value::Object(args)).await
    }

    pub async fn update(&self, id: u64, fields: Map<String, Value>) -> Result<Value> {
        self.client
            .raw()
            .put(&format!("version/{}", id), Value::Object(fields))
            .await
    }

    /// Delete a version, optionally moving its issues to other versions.
    pub async fn delete(
        &self,
        id: u64,
        move_fixed_to: Option<u64>,
        move_affected_to: Option<u64>,
    ) -> Result<()> {
        self.client
            .raw()
            .delete(
                &format!("version/{}", id),
                &json!({
                    "moveFixIssuesTo": move_fixed_to,
                    "moveAffectedIssuesTo": move_affected_to,
                }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::client::tests::{api_path, test_client};
    use crate::api::transport::Payload;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_delete() {
        let (client, transport) = test_client();
        transport.push_json(201, json!({"id": "100", "name": "1.0"}));
        transport.push(204, "", "");

        let mut fields = serde_json::Map::new();
        fields.insert("released".into(), json!(false));
        let created = client.version().create("10000", "1.0", Some(fields)).await.unwrap();
        client.version().delete(100, Some(101), None).await.unwrap();

        let sent = transport.sent();
        assert_eq!(created["id"], "100");
        assert_eq!(
            sent[0].payload,
            Payload::Json(json!({"projectId": 10000, "name": "1.0", "released": false}))
        );
        assert_eq!(api_path(&sent[1].url), "version/100?moveFixIssuesTo=101");
    }
}
