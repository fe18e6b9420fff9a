//! `component` resource.

use serde_json::{json, Map, Value};

use super::merge_into;
use crate::api::{Client, Result};

/// Operations on project components.
#[derive(Debug, Clone, Copy)]
pub struct ComponentSection<'a> {
    client: &'a Client,
}

impl<'a> ComponentSection<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: u64) -> Result<Value> {
        self.client
            .raw()
            .get(&format!("component/{}", id), &Value::Null)
            .await
    }

    /// Create a component.
    ///
    /// `project` is a project key or a numeric project id.
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

        self.client.raw().post("component", Value::Object(args)).await
    }

    pub async fn update(&self, id: u64, fields: Map<String, Value>) -> Result<Value> {
        self.client
            .raw()
            .put(&format!("component/{}", id), Value::Object(fields))
            .await
    }

    /// Delete a component, optionally moving its issues to another one.
    pub async fn delete(&self, id: u64, move_issues_to: Option<u64>) -> Result<()> {
        let args = match move_issues_to {
            Some(target) => json!({"moveIssuesTo": target}),
            None => Value::Null,
        };
        self.client
            .raw()
            .delete(&format!("component/{}", id), &args)
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
    async fn test_create_with_project_key_and_id() {
        let (client, transport) = test_client();
        transport.push_json(201, json!({"id": "1"}));
        transport.push_json(201, json!({"id": "2"}));

        client.component().create("TEST", "Backend", None).await.unwrap();
        let mut extra = serde_json::Map::new();
        extra.insert("description".into(), json!("Server side"));
        client.component().create("10000", "Backend", Some(extra)).await.unwrap();

        let sent = transport.sent();
        assert_eq!(
            sent[0].payload,
            Payload::Json(json!({"project": "TEST", "name": "Backend"}))
        );
        assert_eq!(
            sent[1].payload,
            Payload::Json(json!({"projectId": 10000, "name": "Backend", "description": "Server side"}))
        );
    }

    #[tokio::test]
    async fn test_delete_moves_issues_only_when_asked() {
        let (client, transport) = test_client();
        transport.push(204, "", "");
        transport.push(204, "", "");

        client.component().delete(5, None).await.unwrap();
        client.component().delete(5, Some(6)).await.unwrap();

        let sent = transport.sent();
        assert_eq!(api_path(&sent[0].url), "component/5");
        assert_eq!(api_path(&sent[1].url), "component/5?moveIssuesTo=6");
    }
}
