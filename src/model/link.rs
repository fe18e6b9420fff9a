//! Issue links and link types.

use std::fmt;

use serde_json::{json, Value};
use tracing::{debug, info};

use super::issue::Issue;
use crate::api::types::{decode, LinkInfo, LinkTypeInfo};
use crate::api::Client;
use crate::error::{Error, Result};

/// A kind of link, e.g. "Blocks" (`blocks` / `is blocked by`).
#[derive(Debug, Clone)]
pub struct LinkType {
    client: Client,
    id: u64,
    original: Option<LinkTypeInfo>,
    name: Option<String>,
    inward: Option<String>,
    outward: Option<String>,
}

impl LinkType {
    pub fn new(client: &Client, id: u64) -> Self {
        Self {
            client: client.clone(),
            id,
            original: None,
            name: None,
            inward: None,
            outward: None,
        }
    }

    pub fn from_info(client: &Client, info: LinkTypeInfo) -> Self {
        let mut link_type = Self::new(client, info.id);
        link_type.original = Some(info);
        link_type
    }

    pub async fn get(client: &Client, id: u64) -> Result<Self> {
        let mut link_type = Self::new(client, id);
        link_type.load().await?;
        Ok(link_type)
    }

    /// All link types of the instance.
    pub async fn list(client: &Client) -> Result<Vec<Self>> {
        client
            .issue_link_type()
            .list(false)
            .await?
            .into_iter()
            .map(|value| Ok(Self::from_info(client, decode(value)?)))
            .collect()
    }

    async fn load(&mut self) -> Result<&LinkTypeInfo> {
        let info = match self.original.take() {
            Some(info) => info,
            None if self.id == 0 => LinkTypeInfo::default(),
            None => decode(self.client.issue_link_type().get(self.id, false).await?)?,
        };
        Ok(self.original.insert(info))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn name(&mut self) -> Result<String> {
        Ok(self.load().await?.name.clone())
    }

    /// Description of the inward end, e.g. "is blocked by".
    pub async fn inward(&mut self) -> Result<String> {
        Ok(self.load().await?.inward.clone())
    }

    /// Description of the outward end, e.g. "blocks".
    pub async fn outward(&mut self) -> Result<String> {
        Ok(self.load().await?.outward.clone())
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub fn set_inward(&mut self, inward: &str) {
        self.inward = Some(inward.to_string());
    }

    pub fn set_outward(&mut self, outward: &str) {
        self.outward = Some(outward.to_string());
    }

    /// Create the link type when it has no id yet, update it otherwise.
    pub async fn save(&mut self) -> Result<()> {
        let section = self.client.issue_link_type();
        let answer = if self.id == 0 {
            let (Some(name), Some(inward), Some(outward)) = (&self.name, &self.inward, &self.outward)
            else {
                return Err(Error::link(
                    "Can't create link type without name, inward and outward descriptions",
                ));
            };
            section.create(name, inward, outward).await?
        } else {
            if self.name.is_none() && self.inward.is_none() && self.outward.is_none() {
                return Ok(());
            }
            section
                .update(
                    self.id,
                    self.name.as_deref(),
                    self.inward.as_deref(),
                    self.outward.as_deref(),
                )
                .await?
        };

        let info: LinkTypeInfo = decode(answer)?;
        self.id = info.id;
        self.original = Some(info);
        self.name = None;
        self.inward = None;
        self.outward = None;
        Ok(())
    }

    pub async fn delete(self) -> Result<()> {
        self.client.issue_link_type().delete(self.id).await?;
        Ok(())
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.original {
            Some(info) if !info.name.is_empty() => f.write_str(&info.name),
            _ => write!(f, "{}", self.id),
        }
    }
}

/// A link between two issues: the outward issue "blocks" the inward one.
#[derive(Debug, Clone)]
pub struct Link {
    client: Client,
    id: u64,
    original: Option<LinkInfo>,
}

fn end_key(end: &Option<Value>) -> Option<&str> {
    end.as_ref()
        .and_then(|issue| issue.get("key"))
        .and_then(Value::as_str)
}

impl Link {
    pub fn new(client: &Client, id: u64) -> Self {
        Self {
            client: client.clone(),
            id,
            original: None,
        }
    }

    pub fn from_info(client: &Client, info: LinkInfo) -> Self {
        let mut link = Self::new(client, info.id);
        link.original = Some(info);
        link
    }

    /// Build from an entry of an issue's `issuelinks` field.
    ///
    /// Such entries only carry the far end; `parent_key` is the issue the
    /// field was read from and becomes the other end.
    pub fn from_issue_field(client: &Client, value: Value, parent_key: &str) -> Result<Self> {
        let mut info: LinkInfo = decode(value)?;
        match (&info.inward_issue, &info.outward_issue) {
            (Some(_), Some(_)) => {
                return Err(Error::link(format!(
                    "Link {} from issue {} already has both ends",
                    info.id, parent_key
                )))
            }
            (Some(_), None) => info.outward_issue = Some(json!({"key": parent_key})),
            (None, _) => info.inward_issue = Some(json!({"key": parent_key})),
        }
        Ok(Self::from_info(client, info))
    }

    pub async fn get(client: &Client, id: u64) -> Result<Self> {
        let mut link = Self::new(client, id);
        link.load().await?;
        Ok(link)
    }

    /// Link `outward_key` to `inward_key` and load the created link.
    pub async fn create(
        client: &Client,
        link_type: &str,
        outward_key: &str,
        inward_key: &str,
        comment: Option<&str>,
        visibility: Option<Value>,
    ) -> Result<Self> {
        let links = client.issue_link();
        links
            .create(link_type, outward_key, inward_key, comment, visibility)
            .await?;

        let created = links
            .list_for_issue(outward_key, Some(link_type))
            .await?
            .into_iter()
            .find(|link| link.pointer("/inwardIssue/key").and_then(Value::as_str) == Some(inward_key))
            .and_then(|link| link.get("id").map(crate::api::types::parse_id))
            .filter(|id| *id != 0)
            .ok_or_else(|| Error::link("Failed to create new link or load its info from API after creation"))?;

        info!(id = created, outward = outward_key, inward = inward_key, link_type, "Issues linked");
        Self::get(client, created).await
    }

    async fn load(&mut self) -> Result<&LinkInfo> {
        let info = match self.original.take() {
            Some(info) => info,
            None => decode(self.client.issue_link().get(self.id).await?)?,
        };
        Ok(self.original.insert(info))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Loaded link data, if any.
    pub fn info(&self) -> Option<&LinkInfo> {
        self.original.as_ref()
    }

    pub(crate) fn loaded_inward_key(&self) -> Option<&str> {
        self.original.as_ref().and_then(|info| end_key(&info.inward_issue))
    }

    pub(crate) fn loaded_outward_key(&self) -> Option<&str> {
        self.original.as_ref().and_then(|info| end_key(&info.outward_issue))
    }

    pub async fn link_type(&mut self) -> Result<LinkType> {
        let client = self.client.clone();
        let info = self.load().await?.link_type.clone();
        Ok(LinkType::from_info(&client, info))
    }

    pub async fn inward_key(&mut self) -> Result<Option<String>> {
        Ok(end_key(&self.load().await?.inward_issue).map(str::to_string))
    }

    pub async fn outward_key(&mut self) -> Result<Option<String>> {
        Ok(end_key(&self.load().await?.outward_issue).map(str::to_string))
    }

    /// The inward end, with only the fields embedded in the link loaded.
    pub async fn inward_issue(&mut self) -> Result<Option<Issue>> {
        let client = self.client.clone();
        match self.load().await?.inward_issue.clone() {
            Some(value) => Ok(Some(Issue::from_partial(&client, value)?)),
            None => Ok(None),
        }
    }

    /// The outward end, with only the fields embedded in the link loaded.
    pub async fn outward_issue(&mut self) -> Result<Option<Issue>> {
        let client = self.client.clone();
        match self.load().await?.outward_issue.clone() {
            Some(value) => Ok(Some(Issue::from_partial(&client, value)?)),
            None => Ok(None),
        }
    }

    pub async fn delete(self) -> Result<()> {
        self.client.issue_link().delete(self.id).await?;
        debug!(id = self.id, "Link deleted");
        Ok(())
    }
}

/// Links of one issue.
#[derive(Debug, Clone)]
pub struct LinksList {
    client: Client,
    issue_key: String,
    links: Option<Vec<Link>>,
}

impl LinksList {
    /// Links of an issue, loaded on first use.
    pub fn new(client: &Client, issue_key: &str) -> Self {
        Self {
            client: client.clone(),
            issue_key: issue_key.to_string(),
            links: None,
        }
    }

    /// Links taken from an already loaded `issuelinks` field.
    pub(crate) fn from_values(client: &Client, issue_key: &str, values: Vec<Value>) -> Result<Self> {
        let links = values
            .into_iter()
            .map(|value| Link::from_issue_field(client, value, issue_key))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            client: client.clone(),
            issue_key: issue_key.to_string(),
            links: Some(links),
        })
    }

    pub fn issue_key(&self) -> &str {
        &self.issue_key
    }

    async fn all(&mut self) -> Result<&[Link]> {
        let links = match self.links.take() {
            Some(links) => links,
            None => self
                .client
                .issue_link()
                .list_for_issue(&self.issue_key, None)
                .await?
                .into_iter()
                .map(|value| Link::from_issue_field(&self.client, value, &self.issue_key))
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(self.links.insert(links))
    }

    /// Links, optionally only of one type given by numeric id or name.
    pub async fn links(&mut self, link_type: Option<&str>, case_sensitive: bool) -> Result<Vec<Link>> {
        Ok(self
            .all()
            .await?
            .iter()
            .filter(|link| link_type.map_or(true, |t| type_matches(link, t, case_sensitive)))
            .cloned()
            .collect())
    }

    /// Links where this issue is the outward end, i.e. the other issue is
    /// the inward one.
    pub async fn links_inward(&mut self, link_type: Option<&str>, case_sensitive: bool) -> Result<Vec<Link>> {
        let key = self.issue_key.clone();
        Ok(self
            .links(link_type, case_sensitive)
            .await?
            .into_iter()
            .filter(|link| link.loaded_outward_key() == Some(key.as_str()))
            .collect())
    }

    /// Links where this issue is the inward end.
    pub async fn links_outward(&mut self, link_type: Option<&str>, case_sensitive: bool) -> Result<Vec<Link>> {
        let key = self.issue_key.clone();
        Ok(self
            .links(link_type, case_sensitive)
            .await?
            .into_iter()
            .filter(|link| link.loaded_inward_key() == Some(key.as_str()))
            .collect())
    }

    /// Link `issue_key` as the inward end, e.g. "this blocks `issue_key`".
    pub async fn add_inward(&mut self, issue_key: &str, link_type: &str) -> Result<Link> {
        let link = Link::create(&self.client, link_type, &self.issue_key, issue_key, None, None).await?;
        self.links = None;
        Ok(link)
    }

    /// Link `issue_key` as the outward end, e.g. "`issue_key` blocks this".
    pub async fn add_outward(&mut self, issue_key: &str, link_type: &str) -> Result<Link> {
        let link = Link::create(&self.client, link_type, issue_key, &self.issue_key, None, None).await?;
        self.links = None;
        Ok(link)
    }

    /// Remove links to `issue_key` in both directions. Returns how many were
    /// removed.
    pub async fn remove_link(&mut self, issue_key: &str, link_type: Option<&str>) -> Result<usize> {
        let links = self.links(link_type, false).await?;
        self.remove(links, issue_key).await
    }

    /// Remove links where `issue_key` is the inward end.
    pub async fn remove_link_inward(&mut self, issue_key: &str, link_type: Option<&str>) -> Result<usize> {
        let links = self.links_inward(link_type, false).await?;
        self.remove(links, issue_key).await
    }

    /// Remove links where `issue_key` is the outward end.
    pub async fn remove_link_outward(&mut self, issue_key: &str, link_type: Option<&str>) -> Result<usize> {
        let links = self.links_outward(link_type, false).await?;
        self.remove(links, issue_key).await
    }

    async fn remove(&mut self, links: Vec<Link>, issue_key: &str) -> Result<usize> {
        let mut removed = 0;
        for link in links {
            let other_end = if link.loaded_inward_key() == Some(self.issue_key.as_str()) {
                link.loaded_outward_key()
            } else {
                link.loaded_inward_key()
            };
            if other_end != Some(issue_key) {
                continue;
            }
            let id = link.id();
            link.delete().await?;
            if let Some(links) = self.links.as_mut() {
                links.retain(|l| l.id() != id);
            }
            removed += 1;
        }
        Ok(removed)
    }
}

fn type_matches(link: &Link, link_type: &str, case_sensitive: bool) -> bool {
    let Some(info) = link.info() else {
        return false;
    };
    if let Ok(id) = link_type.parse::<u64>() {
        return info.link_type.id == id;
    }
    if case_sensitive {
        info.link_type.name == link_type
    } else {
        info.link_type.name.to_lowercase() == link_type.to_lowercase()
    }
}
