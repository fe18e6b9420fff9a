//! Project versions, used as fix and affected versions of issues.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::{format_jira_date, parse_date_field};
use crate::api::types::{decode, VersionInfo};
use crate::api::Client;
use crate::error::{Error, Result};

/// A project version (release).
///
/// Like components, a version with id 0 is created on [`Version::save`].
#[derive(Debug, Clone)]
pub struct Version {
    client: Client,
    id: u64,
    original: Option<VersionInfo>,
    project_key: Option<String>,
    update: Map<String, Value>,
}

impl Version {
    pub fn new(client: &Client, id: u64) -> Self {
        Self {
            client: client.clone(),
            id,
            original: None,
            project_key: None,
            update: Map::new(),
        }
    }

    pub fn from_info(client: &Client, info: VersionInfo) -> Self {
        let mut version = Self::new(client, info.id);
        version.original = Some(info);
        version
    }

    pub(crate) fn from_value(client: &Client, value: Value) -> Result<Self> {
        Ok(Self::from_info(client, decode(value)?))
    }

    pub async fn get(client: &Client, id: u64) -> Result<Self> {
        let mut version = Self::new(client, id);
        version.load().await?;
        Ok(version)
    }

    /// Versions of a project given by key or id.
    pub async fn for_project(client: &Client, project: &str) -> Result<Vec<Self>> {
        client
            .project()
            .list_versions(project)
            .await?
            .into_iter()
            .map(|value| Self::from_value(client, value))
            .collect()
    }

    pub async fn by_name(client: &Client, project: &str, name: &str) -> Result<Option<Self>> {
        Ok(Self::for_project(client, project)
            .await?
            .into_iter()
            .find(|v| v.original.as_ref().is_some_and(|info| info.name == name)))
    }

    pub async fn exists(client: &Client, project: &str, name: &str) -> Result<bool> {
        Ok(Self::by_name(client, project, name).await?.is_some())
    }

    async fn load(&mut self) -> Result<&VersionInfo> {
        let info = match self.original.take() {
            Some(info) => info,
            None if self.id == 0 => VersionInfo::default(),
            None => decode(self.client.version().get(self.id).await?)?,
        };
        Ok(self.original.insert(info))
    }

    pub fn drop_cache(&mut self) {
        self.original = None;
        self.project_key = None;
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn pending_update(&self) -> &Map<String, Value> {
        &self.update
    }

    pub async fn name(&mut self) -> Result<String> {
        Ok(self.load().await?.name.clone())
    }

    pub async fn description(&mut self) -> Result<Option<String>> {
        Ok(self.load().await?.description.clone())
    }

    pub async fn project_id(&mut self) -> Result<Option<u64>> {
        Ok(self.load().await?.project_id)
    }

    /// Key of the owning project, looked up by project id.
    pub async fn project_key(&mut self) -> Result<Option<String>> {
        if self.project_key.is_none() {
            let Some(project_id) = self.project_id().await? else {
                return Ok(None);
            };
            let project = self
                .client
                .project()
                .get(&project_id.to_string(), &[])
                .await?;
            self.project_key = project.get("key").and_then(Value::as_str).map(str::to_string);
        }
        Ok(self.project_key.clone())
    }

    pub async fn start_date(&mut self) -> Result<Option<DateTime<Utc>>> {
        let date = self.load().await?.start_date.clone();
        parse_date_field("startDate", date.as_deref())
    }

    pub async fn release_date(&mut self) -> Result<Option<DateTime<Utc>>> {
        let date = self.load().await?.release_date.clone();
        parse_date_field("releaseDate", date.as_deref())
    }

    pub async fn is_archived(&mut self) -> Result<bool> {
        Ok(self.load().await?.archived)
    }

    pub async fn is_released(&mut self) -> Result<bool> {
        Ok(self.load().await?.released)
    }

    pub async fn is_overdue(&mut self) -> Result<bool> {
        Ok(self.load().await?.overdue)
    }

    /// Owning project, by key or numeric id.
    pub fn set_project(&mut self, project: &str) {
        self.update.remove("project");
        self.update.remove("projectId");
        match project.parse::<u64>() {
            Ok(id) => self.update.insert("projectId".into(), json!(id)),
            Err(_) => self.update.insert("project".into(), json!(project)),
        };
    }

    pub fn set_name(&mut self, name: &str) {
        self.update.insert("name".into(), json!(name));
    }

    pub fn set_description(&mut self, description: &str) {
        self.update.insert("description".into(), json!(description));
    }

    pub fn set_start_date(&mut self, date: DateTime<Utc>) {
        self.update
            .insert("startDate".into(), json!(format_jira_date(date)));
    }

    pub fn set_release_date(&mut self, date: DateTime<Utc>) {
        self.update
            .insert("releaseDate".into(), json!(format_jira_date(date)));
    }

    pub fn set_archived(&mut self, archived: bool) {
        self.update.insert("archived".into(), json!(archived));
    }

    pub fn set_released(&mut self, released: bool) {
        self.update.insert("released".into(), json!(released));
    }

    /// Push pending edits, creating the version when it has no id yet.
    pub async fn save(&mut self) -> Result<()> {
        let answer = if self.id != 0 {
            if self.update.is_empty() {
                return Ok(());
            }
            self.client
                .version()
                .update(self.id, self.update.clone())
                .await?
        } else {
            let mut fields = self.update.clone();
            let project = match (fields.remove("projectId"), fields.remove("project")) {
                (Some(id), _) => Some(id.to_string()),
                (None, Some(Value::String(key))) => Some(key),
                _ => None,
            };
            let name = match fields.remove("name") {
                Some(Value::String(name)) => Some(name),
                _ => None,
            };
            let (Some(project), Some(name)) = (project, name) else {
                return Err(Error::version(
                    "Can't create version without project and name",
                ));
            };
            self.client
                .version()
                .create(&project, &name, Some(fields))
                .await?
        };

        let info: VersionInfo = decode(answer)?;
        debug!(id = info.id, name = %info.name, "Version saved");
        self.id = info.id;
        self.original = Some(info);
        self.update.clear();
        Ok(())
    }

    /// Mark the version released today. Does nothing for released versions.
    pub async fn release(&mut self) -> Result<()> {
        if self.is_released().await? {
            return Ok(());
        }
        self.set_released(true);
        if self.release_date().await?.is_none() {
            self.set_release_date(Utc::now());
        }
        self.save().await?;
        info!(id = self.id, "Version released");
        Ok(())
    }

    /// Delete the version, moving its issues to other versions when given.
    pub async fn delete(self, move_fixed_to: Option<u64>, move_affected_to: Option<u64>) -> Result<()> {
        self.client
            .version()
            .delete(self.id, move_fixed_to, move_affected_to)
            .await?;
        Ok(())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.original {
            Some(info) if !info.name.is_empty() => f.write_str(&info.name),
            _ => write!(f, "{}", self.id),
        }
    }
}
