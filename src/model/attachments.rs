//! Issue attachments: single files and the per-issue list.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use super::parse_date_field;
use super::user::User;
use crate::api::types::{decode, AttachmentInfo};
use crate::api::Client;
use crate::error::{Error, Result};

/// An attached file.
#[derive(Debug, Clone)]
pub struct File {
    client: Client,
    id: u64,
    original: Option<AttachmentInfo>,
}

impl File {
    pub fn new(client: &Client, id: u64) -> Self {
        Self {
            client: client.clone(),
            id,
            original: None,
        }
    }

    pub fn from_info(client: &Client, info: AttachmentInfo) -> Self {
        let mut file = Self::new(client, info.id);
        file.original = Some(info);
        file
    }

    pub(crate) fn from_value(client: &Client, value: Value) -> Result<Self> {
        Ok(Self::from_info(client, decode(value)?))
    }

    pub async fn get(client: &Client, id: u64) -> Result<Self> {
        let mut file = Self::new(client, id);
        file.load().await?;
        Ok(file)
    }

    async fn load(&mut self) -> Result<&AttachmentInfo> {
        let info = match self.original.take() {
            Some(info) => info,
            None => decode(self.client.attachment().get(self.id).await?)?,
        };
        Ok(self.original.insert(info))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn name(&mut self) -> Result<String> {
        Ok(self.load().await?.filename.clone())
    }

    /// Size in bytes.
    pub async fn size(&mut self) -> Result<u64> {
        Ok(self.load().await?.size)
    }

    pub async fn mime_type(&mut self) -> Result<String> {
        Ok(self.load().await?.mime_type.clone())
    }

    /// Download link of the content.
    pub async fn content_url(&mut self) -> Result<String> {
        Ok(self.load().await?.content.clone())
    }

    /// Thumbnail link, only present for images.
    pub async fn thumbnail_url(&mut self) -> Result<Option<String>> {
        Ok(self.load().await?.thumbnail.clone())
    }

    pub async fn created(&mut self) -> Result<Option<DateTime<Utc>>> {
        let created = self.load().await?.created.clone();
        parse_date_field("created", created.as_deref())
    }

    pub async fn author(&mut self) -> Result<Option<User>> {
        let client = self.client.clone();
        Ok(self
            .load()
            .await?
            .author
            .clone()
            .map(|info| User::from_info(&client, info)))
    }

    pub async fn delete(self) -> Result<()> {
        self.client.attachment().delete(self.id).await?;
        Ok(())
    }
}

/// Files attached to one issue.
#[derive(Debug, Clone)]
pub struct Attachments {
    client: Client,
    issue_key: String,
    files: Option<Vec<File>>,
}

impl Attachments {
    /// Attachments of an issue, loaded on first use.
    pub fn new(client: &Client, issue_key: &str) -> Self {
        Self {
            client: client.clone(),
            issue_key: issue_key.to_string(),
            files: None,
        }
    }

    /// Attachments taken from an already loaded `attachment` field.
    pub(crate) fn from_values(client: &Client, issue_key: &str, values: Vec<Value>) -> Result<Self> {
        let files = values
            .into_iter()
            .map(|value| File::from_value(client, value))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            client: client.clone(),
            issue_key: issue_key.to_string(),
            files: Some(files),
        })
    }

    pub fn issue_key(&self) -> &str {
        &self.issue_key
    }

    pub async fn files(&mut self) -> Result<&mut Vec<File>> {
        let files = match self.files.take() {
            Some(files) => files,
            None => self
                .client
                .issue()
                .attachments()
                .list(&self.issue_key)
                .await?
                .into_iter()
                .map(|value| File::from_value(&self.client, value))
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(self.files.insert(files))
    }

    /// Upload a local file. `name` defaults to the file name, `mime` is
    /// guessed from the extension.
    pub async fn attach(&mut self, path: &Path, name: Option<&str>, mime: Option<&str>) -> Result<File> {
        if !path.is_file() {
            return Err(Error::attachment(format!(
                "File '{}' does not exist or is not a regular file",
                path.display()
            )));
        }

        let answer = self
            .client
            .issue()
            .attachments()
            .create(&self.issue_key, path, name, mime)
            .await?;
        let file = File::from_value(&self.client, answer)?;
        info!(issue = %self.issue_key, id = file.id(), "File attached");

        if let Some(files) = self.files.as_mut() {
            files.push(file.clone());
        }
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::{api_path, test_client};
    use crate::api::transport::Payload;
    use serde_json::json;
    use std::io::Write;

    fn file_json() -> Value {
        json!({
            "id": "10300",
            "filename": "report.txt",
            "size": 12,
            "mimeType": "text/plain",
            "content": "https://jira.localhost/secure/attachment/10300/report.txt",
            "created": "2024-01-02T10:00:00.000+0000",
            "author": {"name": "jdoe"}
        })
    }

    #[tokio::test]
    async fn test_files_loaded_from_issue() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({"key": "TEST-1", "fields": {"attachment": [file_json()]}}));

        let mut attachments = Attachments::new(&client, "TEST-1");
        let files = attachments.files().await.unwrap();
        assert_eq!(files.len(), 1);

        let file = &mut files[0];
        assert_eq!(file.name().await.unwrap(), "report.txt");
        assert_eq!(file.size().await.unwrap(), 12);
        assert_eq!(file.mime_type().await.unwrap(), "text/plain");
        assert!(file.thumbnail_url().await.unwrap().is_none());
        assert_eq!(file.author().await.unwrap().unwrap().name(), "jdoe");
        assert!(file.created().await.unwrap().is_some());

        attachments.files().await.unwrap();
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_attach_missing_file() {
        let (client, transport) = test_client();
        let mut attachments = Attachments::from_values(&client, "TEST-1", vec![]).unwrap();

        let err = attachments
            .attach(Path::new("/definitely/not/here.txt"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Attachment(_)));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_attach_uploads_file() {
        let (client, transport) = test_client();
        transport.push_json(200, json!([file_json()]));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let mut handle = std::fs::File::create(&path).unwrap();
        handle.write_all(b"hello report").unwrap();

        let mut attachments = Attachments::from_values(&client, "TEST-1", vec![]).unwrap();
        let file = attachments.attach(&path, None, None).await.unwrap();
        assert_eq!(file.id(), 10300);
        assert_eq!(attachments.files().await.unwrap().len(), 1);

        let sent = transport.sent();
        assert_eq!(api_path(&sent[0].url), "issue/TEST-1/attachments");
        match &sent[0].payload {
            Payload::Multipart(parts) => {
                assert_eq!(parts[0].file_name, "report.txt");
                assert_eq!(parts[0].mime, "text/plain");
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_file() {
        let (client, transport) = test_client();
        transport.push(204, "", "");
        File::new(&client, 10300).delete().await.unwrap();
        assert_eq!(api_path(&transport.sent()[0].url), "attachment/10300");
    }
}
