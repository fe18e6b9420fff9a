//! Issue comments.
//!
//! A [`Comment`] loads its JSON on first access and can be edited or deleted
//! in place.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::parse_date_field;
use super::user::User;
use crate::api::types::{decode, CommentInfo};
use crate::api::Client;
use crate::error::Result;

/// A comment on an issue.
#[derive(Debug, Clone)]
pub struct Comment {
    client: Client,
    issue_key: String,
    id: u64,
    original: Option<CommentInfo>,
}

impl Comment {
    pub fn new(client: &Client, issue_key: &str, id: u64) -> Self {
        Self {
            client: client.clone(),
            issue_key: issue_key.to_string(),
            id,
            original: None,
        }
    }

    pub fn from_info(client: &Client, issue_key: &str, info: CommentInfo) -> Self {
        let mut comment = Self::new(client, issue_key, info.id);
        comment.original = Some(info);
        comment
    }

    pub(crate) fn from_value(client: &Client, issue_key: &str, value: Value) -> Result<Self> {
        Ok(Self::from_info(client, issue_key, decode(value)?))
    }

    pub async fn get(client: &Client, issue_key: &str, id: u64) -> Result<Self> {
        let mut comment = Self::new(client, issue_key, id);
        comment.load(false).await?;
        Ok(comment)
    }

    async fn load(&mut self, rendered: bool) -> Result<&CommentInfo> {
        let info = match self.original.take() {
            Some(info) if !rendered || info.rendered_body.is_some() => info,
            _ => decode(
                self.client
                    .issue()
                    .comment()
                    .get(&self.issue_key, self.id, rendered)
                    .await?,
            )?,
        };
        Ok(self.original.insert(info))
    }

    pub fn drop_cache(&mut self) {
        self.original = None;
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn issue_key(&self) -> &str {
        &self.issue_key
    }

    pub async fn text(&mut self) -> Result<String> {
        Ok(self.load(false).await?.body.clone())
    }

    /// HTML rendering of the comment body.
    pub async fn rendered(&mut self) -> Result<String> {
        Ok(self
            .load(true)
            .await?
            .rendered_body
            .clone()
            .unwrap_or_default())
    }

    pub async fn created(&mut self) -> Result<Option<DateTime<Utc>>> {
        let created = self.load(false).await?.created.clone();
        parse_date_field("created", created.as_deref())
    }

    pub async fn updated(&mut self) -> Result<Option<DateTime<Utc>>> {
        let updated = self.load(false).await?.updated.clone();
        parse_date_field("updated", updated.as_deref())
    }

    pub async fn author(&mut self) -> Result<Option<User>> {
        let client = self.client.clone();
        Ok(self
            .load(false)
            .await?
            .author
            .clone()
            .map(|info| User::from_info(&client, info)))
    }

    pub async fn update_author(&mut self) -> Result<Option<User>> {
        let client = self.client.clone();
        Ok(self
            .load(false)
            .await?
            .update_author
            .clone()
            .map(|info| User::from_info(&client, info)))
    }

    /// Check if the comment text contains `needle`.
    pub async fn contains(&mut self, needle: &str) -> Result<bool> {
        Ok(self.text().await?.contains(needle))
    }

    /// Replace the comment text.
    pub async fn update(&mut self, text: &str, visibility: Option<Value>) -> Result<()> {
        let answer = self
            .client
            .issue()
            .comment()
            .update(&self.issue_key, self.id, text, visibility, false)
            .await?;
        self.original = Some(decode(answer)?);
        Ok(())
    }

    pub async fn delete(self) -> Result<()> {
        self.client
            .issue()
            .comment()
            .delete(&self.issue_key, self.id)
            .await?;
        Ok(())
    }
}
