//! The issue wrapper.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::attachments::{Attachments, File};
use super::comment::Comment;
use super::component::Component;
use super::dictionary::{IssueType, Priority, Resolution, Security, Status};
use super::history::History;
use super::link::LinksList;
use super::parse_date_field;
use super::user::User;
use super::version::Version;
use super::watchers::WatchersList;
use crate::api::types::{decode, parse_id, IssueInfo};
use crate::api::Client;
use crate::error::{Error, Result};

const EXPAND_CHANGELOG: &str = "changelog";
const EXPAND_RENDERED_FIELDS: &str = "renderedFields";

/// Page size for searches made by the wrapper.
const SEARCH_LIMIT: u32 = 1000;

/// A JIRA issue.
///
/// Field values come from one cached `GET issue` answer. An issue loaded
/// with a partial field list only knows those fields; asking for any other
/// field reloads the whole issue.
#[derive(Debug, Clone)]
pub struct Issue {
    client: Client,
    key: String,
    original: Option<IssueInfo>,
    partial_fields: Option<Vec<String>>,
    expand: Vec<String>,
    update: Map<String, Value>,
    history: Option<History>,
    watchers: Option<WatchersList>,
    edit_meta: Option<Map<String, Value>>,
}

fn check_load_args(fields: &[&str], expand: &[&str]) -> Result<()> {
    if !fields.is_empty() && !expand.is_empty() {
        return Err(Error::issue(
            "Issue object does not support partial fields load in combination with non-empty \
             'expand' parameter. Use any of them, but not both.",
        ));
    }
    Ok(())
}

fn id_or_name(item: &str) -> Value {
    match item.parse::<u64>() {
        Ok(id) => json!({"id": id.to_string()}),
        Err(_) => json!({"name": item}),
    }
}

fn dedup(items: &[&str]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.iter().any(|u| u == item) {
            unique.push(item.to_string());
        }
    }
    unique
}

impl Issue {
    /// Wrap an issue key. The key is trimmed and must not be empty.
    pub fn new(client: &Client, key: &str) -> Result<Self> {
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::issue("Can't create Issue object with empty issue key"));
        }
        Ok(Self {
            client: client.clone(),
            key: key.to_string(),
            original: None,
            partial_fields: None,
            expand: Vec::new(),
            update: Map::new(),
            history: None,
            watchers: None,
            edit_meta: None,
        })
    }

    /// Wrap issue data loaded with the given `fields` and `expand` lists.
    pub fn from_info(client: &Client, mut info: IssueInfo, fields: &[&str], expand: &[&str]) -> Result<Self> {
        if info.key.is_empty() {
            return Err(Error::issue("Provided data does not contain attribute \"key\""));
        }
        check_load_args(fields, expand)?;

        let mut issue = Self::new(client, &info.key)?;
        if fields.is_empty() {
            issue.expand = expand.iter().map(|e| e.to_string()).collect();
        } else {
            info.fields.retain(|id, _| fields.contains(&id.as_str()));
            issue.partial_fields = Some(fields.iter().map(|f| f.to_string()).collect());
        }
        issue.original = Some(info);
        Ok(issue)
    }

    /// Wrap an issue embedded in another object (a link, a parent
    /// reference). Only the embedded fields are known.
    pub(crate) fn from_partial(client: &Client, value: Value) -> Result<Self> {
        let info: IssueInfo = decode(value)?;
        let fields: Vec<String> = info.fields.keys().cloned().collect();
        let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
        if fields.is_empty() {
            let mut issue = Self::new(client, &info.key)?;
            issue.partial_fields = Some(Vec::new());
            issue.original = Some(info);
            return Ok(issue);
        }
        Self::from_info(client, info, &fields, &[])
    }

    /// Load an issue by key.
    pub async fn by_key(client: &Client, key: &str, fields: &[&str], expand: &[&str]) -> Result<Self> {
        check_load_args(fields, expand)?;
        let value = client.issue().get(key, fields, expand).await?;
        Self::from_info(client, decode(value)?, fields, expand)
    }

    /// Load several issues with one search. No keys, no request.
    pub async fn by_keys(client: &Client, keys: &[&str], fields: &[&str], expand: &[&str]) -> Result<Vec<Self>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let jql = format!("key IN ({})", keys.join(","));
        Self::search(client, &jql, fields, expand, Some(SEARCH_LIMIT), 0).await
    }

    /// Find issues with JQL, in the order JIRA returns them.
    pub async fn search(
        client: &Client,
        jql: &str,
        fields: &[&str],
        expand: &[&str],
        max_results: Option<u32>,
        start_at: u32,
    ) -> Result<Vec<Self>> {
        check_load_args(fields, expand)?;
        client
            .issue()
            .search(jql, fields, expand, max_results, start_at)
            .await?
            .into_iter()
            .map(|value| Self::from_info(client, decode(value)?, fields, expand))
            .collect()
    }

    /// Forget loaded data and everything derived from it. Pending edits are
    /// kept.
    pub fn drop_cache(&mut self) {
        self.original = None;
        self.partial_fields = None;
        self.history = None;
        self.watchers = None;
        self.edit_meta = None;
    }

    async fn load(&mut self, expand: &[&str]) -> Result<&IssueInfo> {
        for group in expand {
            if !self.expand.iter().any(|e| e == group) {
                self.drop_cache();
                self.expand.push(group.to_string());
            }
        }

        let info = match self.original.take() {
            Some(info) => info,
            None => {
                self.drop_cache();
                let expand: Vec<&str> = self.expand.iter().map(String::as_str).collect();
                debug!(key = %self.key, ?expand, "Loading issue");
                decode(self.client.issue().get(&self.key, &[], &expand).await?)?
            }
        };
        Ok(self.original.insert(info))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loaded issue data, if any.
    pub fn info(&self) -> Option<&IssueInfo> {
        self.original.as_ref()
    }

    /// Raw value of a field, `None` when the field is empty.
    pub async fn field_value(&mut self, field_id: &str) -> Result<Option<Value>> {
        if self
            .partial_fields
            .as_ref()
            .is_some_and(|fields| !fields.iter().any(|f| f == field_id))
        {
            self.drop_cache();
        }
        Ok(self.load(&[]).await?.field(field_id).cloned())
    }

    async fn string_field(&mut self, field_id: &str) -> Result<String> {
        Ok(self
            .field_value(field_id)
            .await?
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default())
    }

    async fn list_field(&mut self, field_id: &str) -> Result<Vec<Value>> {
        Ok(match self.field_value(field_id).await? {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        })
    }

    pub async fn id(&mut self) -> Result<u64> {
        Ok(self.load(&[]).await?.id.as_ref().map(parse_id).unwrap_or(0))
    }

    pub async fn self_url(&mut self) -> Result<String> {
        Ok(self.load(&[]).await?.self_url.clone().unwrap_or_default())
    }

    pub async fn summary(&mut self) -> Result<String> {
        self.string_field("summary").await
    }

    pub async fn description(&mut self) -> Result<String> {
        self.string_field("description").await
    }

    pub async fn labels(&mut self) -> Result<Vec<String>> {
        Ok(self
            .list_field("labels")
            .await?
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect())
    }

    pub async fn status(&mut self) -> Result<Option<Status>> {
        match self.field_value("status").await? {
            Some(value) => Ok(Some(Status::from_value(&self.client, value)?)),
            None => Ok(None),
        }
    }

    pub async fn issue_type(&mut self) -> Result<Option<IssueType>> {
        match self.field_value("issuetype").await? {
            Some(value) => Ok(Some(IssueType::from_value(&self.client, value)?)),
            None => Ok(None),
        }
    }

    /// Issue priority. Issues may have none.
    pub async fn priority(&mut self) -> Result<Option<Priority>> {
        match self.field_value("priority").await? {
            Some(value) => Ok(Some(Priority::from_value(&self.client, value)?)),
            None => Ok(None),
        }
    }

    /// Resolution, `None` while unresolved.
    pub async fn resolution(&mut self) -> Result<Option<Resolution>> {
        match self.field_value("resolution").await? {
            Some(value) => Ok(Some(Resolution::from_value(&self.client, value)?)),
            None => Ok(None),
        }
    }

    pub async fn security(&mut self) -> Result<Option<Security>> {
        match self.field_value("security").await? {
            Some(value) => Ok(Some(Security::from_value(&self.client, value)?)),
            None => Ok(None),
        }
    }

    pub async fn assignee(&mut self) -> Result<Option<User>> {
        match self.field_value("assignee").await? {
            Some(value) => Ok(Some(User::from_value(&self.client, value)?)),
            None => Ok(None),
        }
    }

    pub async fn reporter(&mut self) -> Result<Option<User>> {
        match self.field_value("reporter").await? {
            Some(value) => Ok(Some(User::from_value(&self.client, value)?)),
            None => Ok(None),
        }
    }

    pub async fn components(&mut self) -> Result<Vec<Component>> {
        self.list_field("components")
            .await?
            .into_iter()
            .map(|value| -> Result<Component> { Ok(Component::from_info(&self.client, decode(value)?)) })
            .collect()
    }

    /// Fix versions. JIRA omits their project id here, so the issue's
    /// project id is filled in.
    pub async fn versions(&mut self) -> Result<Vec<Version>> {
        let project_id = self
            .field_value("project")
            .await?
            .and_then(|project| project.get("id").map(parse_id));
        self.list_field("fixVersions")
            .await?
            .into_iter()
            .map(|mut value| {
                if let (Some(id), Some(version)) = (project_id, value.as_object_mut()) {
                    version.insert("projectId".into(), json!(id));
                }
                Version::from_value(&self.client, value)
            })
            .collect()
    }

    /// Date value of any date or date-time field.
    pub async fn date_field(&mut self, field_id: &str) -> Result<Option<DateTime<Utc>>> {
        let value = self.field_value(field_id).await?;
        parse_date_field(field_id, value.as_ref().and_then(Value::as_str))
    }

    pub async fn created(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.date_field("created").await
    }

    pub async fn updated(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.date_field("updated").await
    }

    pub async fn due_date(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.date_field("duedate").await
    }

    pub async fn resolution_date(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.date_field("resolutiondate").await
    }

    /// HTML rendering of a field.
    pub async fn rendered_field(&mut self, field_id: &str) -> Result<Option<String>> {
        Ok(self
            .load(&[EXPAND_RENDERED_FIELDS])
            .await?
            .rendered_fields
            .as_ref()
            .and_then(|fields| fields.get(field_id))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Comments embedded in the issue. `reload` fetches the issue again.
    pub async fn comments(&mut self, reload: bool) -> Result<Vec<Comment>> {
        if reload {
            self.drop_cache();
        }
        let list = self
            .field_value("comment")
            .await?
            .and_then(|c| c.get("comments").cloned())
            .unwrap_or(Value::Null);
        let list = match list {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        list.into_iter()
            .map(|value| Comment::from_value(&self.client, &self.key, value))
            .collect()
    }

    /// A comment by id, loaded on first use.
    pub fn comment(&self, id: u64) -> Comment {
        Comment::new(&self.client, &self.key, id)
    }

    pub async fn last_comment(&mut self, reload: bool) -> Result<Option<Comment>> {
        Ok(self.comments(reload).await?.pop())
    }

    pub async fn attachments(&mut self) -> Result<Attachments> {
        let files = self.list_field("attachment").await?;
        Attachments::from_values(&self.client, &self.key, files)
    }

    pub async fn links_list(&mut self) -> Result<LinksList> {
        let links = self.list_field("issuelinks").await?;
        LinksList::from_values(&self.client, &self.key, links)
    }

    /// Watchers, loaded once and kept until the cache is dropped.
    pub fn watchers(&mut self) -> &mut WatchersList {
        let client = &self.client;
        let key = &self.key;
        self.watchers
            .get_or_insert_with(|| WatchersList::new(client, key))
    }

    /// Changelog of the issue.
    pub async fn history(&mut self) -> Result<&History> {
        let history = match self.history.take() {
            Some(history) => history,
            None => {
                let page = self
                    .load(&[EXPAND_CHANGELOG])
                    .await?
                    .changelog
                    .clone()
                    .unwrap_or_default();
                History::from_page(page)?
            }
        };
        Ok(self.history.insert(history))
    }

    /// Keys the issue had before it was moved between projects.
    pub async fn prev_keys(&mut self) -> Result<Vec<String>> {
        Ok(self
            .history()
            .await?
            .track_field("Key")
            .into_iter()
            .filter(|(_, item)| item.is_string_changed())
            .filter_map(|(_, item)| item.from_string.clone())
            .collect())
    }

    /// Time since the last status change.
    pub async fn time_in_last_status(&mut self) -> Result<Duration> {
        let now = Utc::now();
        let created = self.created().await?.unwrap_or(now);
        Ok(self.history().await?.time_in_last_status(created, now))
    }

    /// Working days the issue spent in `status`.
    pub async fn workdays_in_status(&mut self, status: &str) -> Result<f64> {
        let now = Utc::now();
        let created = self.created().await?.unwrap_or(now);
        let current = self
            .field_value("status")
            .await?
            .and_then(|s| s.get("name").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default();
        Ok(self
            .history()
            .await?
            .workdays_in_status(status, created, &current, now))
    }

    pub async fn is_sub_issue(&mut self) -> Result<bool> {
        Ok(self.field_value("parent").await?.is_some())
    }

    pub async fn has_sub_issues(&mut self) -> Result<bool> {
        Ok(!self.list_field("subtasks").await?.is_empty())
    }

    /// Parent issue of a sub-task, loaded in full.
    pub async fn parent(&mut self) -> Result<Option<Issue>> {
        let parent_key = self
            .field_value("parent")
            .await?
            .and_then(|p| p.get("key").and_then(Value::as_str).map(str::to_string));
        match parent_key {
            Some(key) => Ok(Some(Issue::by_key(&self.client, &key, &[], &[]).await?)),
            None => Ok(None),
        }
    }

    pub async fn sub_issues(&self) -> Result<Vec<Issue>> {
        let jql = format!("parent = '{}'", self.key);
        Issue::search(&self.client, &jql, &[], &[], Some(SEARCH_LIMIT), 0).await
    }

    /// Editable fields of the issue, keyed by field id.
    pub async fn edit_meta(&mut self) -> Result<&Map<String, Value>> {
        let meta = match self.edit_meta.take() {
            Some(meta) => meta,
            None => self.client.issue().edit_meta(&self.key).await?,
        };
        Ok(self.edit_meta.insert(meta))
    }

    pub async fn is_editable(&mut self, field_id: &str) -> Result<bool> {
        Ok(self.edit_meta().await?.contains_key(field_id))
    }

    /// Project key, taken from the issue key.
    pub fn project(&self) -> &str {
        self.key.split('-').next().unwrap_or_default()
    }

    pub fn is_in_project(&self, projects: &[&str]) -> bool {
        projects.contains(&self.project())
    }

    /// Browser link to the issue.
    pub fn url(&self) -> String {
        format!("{}browse/{}", self.client.jira_url(), self.key)
    }

    /// Edits not saved yet, keyed by field id.
    pub fn pending_update(&self) -> &Map<String, Value> {
        &self.update
    }

    /// Pending update operations of one field.
    pub fn pending_edit(&self, field_id: &str) -> Option<&Value> {
        self.update.get(field_id)
    }

    /// Replace the pending update operations of a field.
    pub fn edit(&mut self, field_id: &str, update: Value) -> &mut Self {
        self.update.insert(field_id.to_string(), update);
        self
    }

    fn append_edit(&mut self, field_id: &str, operations: impl IntoIterator<Item = Value>) -> &mut Self {
        let mut list = match self.update.remove(field_id) {
            Some(Value::Array(list)) => list,
            _ => Vec::new(),
        };
        list.extend(operations);
        self.edit(field_id, Value::Array(list))
    }

    pub fn set_summary(&mut self, summary: &str) -> &mut Self {
        self.edit("summary", json!([{"set": summary}]))
    }

    pub fn set_description(&mut self, description: &str) -> &mut Self {
        self.edit("description", json!([{"set": description}]))
    }

    /// Replace labels. Duplicates are dropped.
    pub fn set_labels(&mut self, labels: &[&str]) -> &mut Self {
        self.edit("labels", json!([{"set": dedup(labels)}]))
    }

    pub fn add_labels(&mut self, labels: &[&str]) -> &mut Self {
        let operations: Vec<Value> = dedup(labels).into_iter().map(|l| json!({"add": l})).collect();
        self.append_edit("labels", operations)
    }

    /// Replace components, given by numeric id or name.
    pub fn set_components(&mut self, components: &[&str]) -> &mut Self {
        let items: Vec<Value> = components.iter().map(|c| id_or_name(c)).collect();
        self.edit("components", json!([{"set": items}]))
    }

    pub fn add_components(&mut self, components: &[&str]) -> &mut Self {
        let operations: Vec<Value> = components.iter().map(|c| json!({"add": id_or_name(c)})).collect();
        self.append_edit("components", operations)
    }

    pub fn remove_components(&mut self, components: &[&str]) -> &mut Self {
        let operations: Vec<Value> = components
            .iter()
            .map(|c| json!({"remove": id_or_name(c)}))
            .collect();
        self.append_edit("components", operations)
    }

    pub fn set_priority(&mut self, id: u64) -> &mut Self {
        self.edit("priority", json!([{"set": {"id": id.to_string()}}]))
    }

    pub fn set_resolution(&mut self, id: u64) -> &mut Self {
        self.edit("resolution", json!([{"set": {"id": id.to_string()}}]))
    }

    pub fn set_security(&mut self, id: u64) -> &mut Self {
        self.edit("security", json!([{"set": {"id": id.to_string()}}]))
    }

    pub fn set_assignee(&mut self, login: &str) -> &mut Self {
        self.edit("assignee", json!([{"set": {"name": login}}]))
    }

    pub fn set_reporter(&mut self, login: &str) -> &mut Self {
        self.edit("reporter", json!([{"set": {"name": login}}]))
    }

    /// Add a fix version by name and save the issue.
    ///
    /// With `create` set, a missing version is created in the issue's
    /// project first.
    pub async fn add_version(&mut self, name: &str, create: bool) -> Result<Version> {
        let mut to_set = Vec::new();
        for mut version in self.versions().await? {
            if version.name().await? == name {
                return Ok(version);
            }
            to_set.push(json!({"id": version.id().to_string()}));
        }

        let project = self.project().to_string();
        let version = match Version::by_name(&self.client, &project, name).await? {
            Some(version) => version,
            None if create => {
                let mut version = Version::new(&self.client, 0);
                version.set_project(&project);
                version.set_name(name);
                version.save().await?;
                version
            }
            None => {
                return Err(Error::version(format!(
                    "Version '{}' not found in project {}",
                    name, project
                )))
            }
        };

        to_set.push(json!({"id": version.id().to_string()}));
        self.edit("fixVersions", json!([{"set": to_set}]));
        self.save(None, true).await?;
        Ok(version)
    }

    pub async fn add_comment(
        &mut self,
        text: &str,
        visibility: Option<Value>,
        expand_rendered: bool,
    ) -> Result<Comment> {
        let answer = self
            .client
            .issue()
            .comment()
            .create(&self.key, text, visibility, expand_rendered)
            .await?;
        self.drop_cache();
        Comment::from_value(&self.client, &self.key, answer)
    }

    pub async fn attach_file(&mut self, path: &Path, name: Option<&str>, mime: Option<&str>) -> Result<File> {
        let file = Attachments::new(&self.client, &self.key)
            .attach(path, name, mime)
            .await?;
        self.drop_cache();
        Ok(file)
    }

    /// Push pending edits in one request. Does nothing without edits.
    pub async fn save(&mut self, properties: Option<Vec<Value>>, notify_users: bool) -> Result<()> {
        if self.update.is_empty() {
            return Ok(());
        }
        debug!(key = %self.key, fields = ?self.update.keys().collect::<Vec<_>>(), "Saving issue");
        self.client
            .issue()
            .edit(&self.key, None, Some(self.update.clone()), properties, notify_users)
            .await?;
        self.update.clear();
        self.drop_cache();
        Ok(())
    }

    /// Perform a workflow transition, sending pending edits with it.
    pub async fn transition(&mut self, transition_id: u64, safe: bool) -> Result<()> {
        let update = Some(self.update.clone());
        let transitions = self.client.issue().transitions();
        if safe {
            transitions
                .perform_safe(&self.key, transition_id, None, update)
                .await?;
        } else {
            transitions.perform(&self.key, transition_id, None, update).await?;
        }
        info!(key = %self.key, transition_id, "Issue transitioned");
        self.update.clear();
        self.drop_cache();
        Ok(())
    }

    /// Move the issue to status `name`, sending pending edits with it.
    ///
    /// Fails with `Error::Transition` when the issue already is in that
    /// status, unless `same_status` is set.
    pub async fn step(&mut self, name: &str, same_status: bool, safe: bool) -> Result<()> {
        self.client
            .issue()
            .transitions()
            .step(&self.key, name, None, Some(self.update.clone()), safe, same_status)
            .await?;
        self.update.clear();
        self.drop_cache();
        Ok(())
    }

    pub async fn delete(self, delete_subtasks: bool) -> Result<()> {
        self.client.issue().delete(&self.key, delete_subtasks).await?;
        info!(key = %self.key, "Issue deleted");
        Ok(())
    }

    /// Pick up a new key after the issue was moved to another project.
    pub async fn update_key(&mut self, reload: bool) -> Result<()> {
        if reload {
            self.drop_cache();
        }
        let key = self.load(&[]).await?.key.clone();
        if !key.is_empty() {
            self.key = key;
        }
        Ok(())
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self
            .original
            .as_ref()
            .and_then(|info| info.field("summary"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        write!(f, "[{}]: {}", self.key, summary)
    }
}
