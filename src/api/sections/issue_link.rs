//! `issueLink` resource.

use serde_json::{json, Map, Value};

use crate::api::{Client, Result};

/// Links between issues.
#[derive(Debug, Clone, Copy)]
pub struct IssueLinkSection<'a> {
    client: &'a Client,
}

impl<'a> IssueLinkSection<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Link two issues, e.g. `outward` "blocks" `inward`.
    ///
    /// JIRA answers with an empty body; use [`Self::list_for_issue`] to
    /// find the created link.
    pub async fn create(
        &self,
        link_type: &str,
        outward_issue: &str,
        inward_issue: &str,
        comment: Option<&str>,
        visibility: Option<Value>,
    ) -> Result<()> {
        let mut args = Map::new();
        args.insert("type".into(), json!({"name": link_type}));
        args.insert("inwardIssue".into(), json!({"key": inward_issue}));
        args.insert("outwardIssue".into(), json!({"key": outward_issue}));
        if let Some(body) = comment {
            let mut comment = Map::new();
            comment.insert("body".into(), json!(body));
            if let Some(visibility) = visibility {
                comment.insert("visibility".into(), visibility);
            }
            args.insert("comment".into(), Value::Object(comment));
        }

        self.client.raw().post("issueLink", Value::Object(args)).await?;
        Ok(())
    }

    pub async fn get(&self, id: u64) -> Result<Value> {
        self.client
            .raw()
            .get(&format!("issueLink/{}", id), &Value::Null)
            .await
    }

    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client
            .raw()
            .delete(&format!("issueLink/{}", id), &Value::Null)
            .await?;
        Ok(())
    }

    /// Links of an issue, optionally only those of one link type (by name).
    pub async fn list_for_issue(&self, key: &str, link_type: Option<&str>) -> Result<Vec<Value>> {
        let issue = self
            .client
            .raw()
            .get(&format!("issue/{}", key), &json!({"fields": "issuelinks"}))
            .await?;

        let links = issue
            .pointer("/fields/issuelinks")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(match link_type {
            Some(name) => links
                .into_iter()
                .filter(|link| link.pointer("/type/name").and_then(Value::as_str) == Some(name))
                .collect(),
            None => links,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::api::client::tests::{api_path, test_client};
    use crate::api::transport::Payload;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_body() {
        let (client, transport) = test_client();
        transport.push(201, "", "");

        client
            .issue_link()
            .create("Blocks", "TEST-1", "TEST-2", Some("Blocked by backend"), None)
            .await
            .unwrap();

        assert_eq!(
            transport.sent()[0].payload,
            Payload::Json(json!({
                "type": {"name": "Blocks"},
                "inwardIssue": {"key": "TEST-2"},
                "outwardIssue": {"key": "TEST-1"},
                "comment": {"body": "Blocked by backend"},
            }))
        );
    }

    #[tokio::test]
    async fn test_list_for_issue_filters_by_type() {
        let (client, transport) = test_client();
        transport.push_json(
            200,
            json!({"key": "TEST-1", "fields": {"issuelinks": [
                {"id": "1", "type": {"name": "Blocks"}, "inwardIssue": {"key": "TEST-2"}},
                {"id": "2", "type": {"name": "Relates"}, "outwardIssue": {"key": "TEST-3"}}
            ]}}),
        );

        let links = client
            .issue_link()
            .list_for_issue("TEST-1", Some("Blocks"))
            .await
            .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0]["id"], "1");
        assert_eq!(
            api_path(&transport.sent()[0].url),
            "issue/TEST-1?fields=issuelinks"
        );
    }
}
