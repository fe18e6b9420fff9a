//! `attachment` resource.

use serde_json::Value;

use crate::api::{Client, Result};

/// Operations on attachments by id.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentSection<'a> {
    client: &'a Client,
}

impl<'a> AttachmentSection<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Get attachment metadata.
    pub async fn get(&self, id: u64) -> Result<Value> {
        self.client
            .raw()
            .get(&format!("attachment/{}", id), &Value::Null)
            .await
    }

    /// Delete an attachment.
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client
            .raw()
            .delete(&format!("attachment/{}", id), &Value::Null)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::client::tests::{api_path, test_client};
    use crate::api::transport::RequestMethod;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_and_delete() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({"id": "10", "filename": "a.txt"}));
        transport.push(204, "", "");

        let info = client.attachment().get(10).await.unwrap();
        assert_eq!(info["filename"], "a.txt");
        client.attachment().delete(10).await.unwrap();

        let sent = transport.sent();
        assert_eq!(api_path(&sent[0].url), "attachment/10");
        assert_eq!(sent[1].method, RequestMethod::Delete);
        assert_eq!(api_path(&sent[1].url), "attachment/10");
    }
}
