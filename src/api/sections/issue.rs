//! Issue operations and the per-issue sub-sections.

use std::path::Path;

use serde_json::{json, Map, Value};
use tracing::{debug, trace, warn};

use super::{join_list, take_list};
use crate::api::transport::FilePart;
use crate::api::{ApiError, Client, Result};
use crate::cache::compose_pairs_key;
use crate::error::Error;

/// Page size of issue searches made through this section.
const SEARCH_MAX_RESULTS: u32 = 1000;

/// Operations on issues.
#[derive(Debug, Clone, Copy)]
pub struct IssueSection<'a> {
    client: &'a Client,
}

impl<'a> IssueSection<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Get an issue with the listed fields (all when empty) and expands.
    pub async fn get(&self, key: &str, fields: &[&str], expand: &[&str]) -> Result<Value> {
        self.client
            .raw()
            .get(
                &format!("issue/{}", key),
                &json!({"fields": join_list(fields), "expand": join_list(expand)}),
            )
            .await
    }

    /// Create an issue.
    ///
    /// `project` and `issue_type` accept either numeric ids or a key/name.
    pub async fn create(
        &self,
        project: &str,
        issue_type: &str,
        summary: &str,
        fields: Option<Map<String, Value>>,
    ) -> Result<Value> {
        let project = match project.parse::<u64>() {
            Ok(_) => json!({"id": project}),
            Err(_) => json!({"key": project}),
        };
        let issue_type = match issue_type.parse::<u64>() {
            Ok(_) => json!({"id": issue_type}),
            Err(_) => json!({"name": issue_type}),
        };

        let mut all_fields = fields.unwrap_or_default();
        all_fields.insert("project".into(), project);
        all_fields.insert("issuetype".into(), issue_type);
        all_fields.insert("summary".into(), json!(summary));

        self.client
            .raw()
            .post("issue", json!({"fields": all_fields}))
            .await
    }

    /// Edit an issue: plain field values, update operations and properties.
    pub async fn edit(
        &self,
        key: &str,
        fields: Option<Map<String, Value>>,
        update: Option<Map<String, Value>>,
        properties: Option<Vec<Value>>,
        notify_users: bool,
    ) -> Result<()> {
        let mut args = Map::new();
        if let Some(fields) = fields {
            args.insert("fields".into(), Value::Object(fields));
        }
        if let Some(update) = update {
            args.insert("update".into(), Value::Object(update));
        }
        if let Some(properties) = properties {
            args.insert("properties".into(), Value::Array(properties));
        }

        let mut api_method = format!("issue/{}", key);
        if !notify_users {
            api_method.push_str("?notifyUsers=false");
        }
        self.client.raw().put(&api_method, Value::Object(args)).await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str, delete_subtasks: bool) -> Result<()> {
        self.client
            .raw()
            .delete(
                &format!("issue/{}", key),
                &json!({"deleteSubtasks": delete_subtasks}),
            )
            .await?;
        Ok(())
    }

    /// Assign an issue; `None` unassigns it.
    pub async fn assign(&self, key: &str, login: Option<&str>) -> Result<()> {
        self.client
            .raw()
            .put(&format!("issue/{}/assignee", key), json!({"name": login}))
            .await?;
        Ok(())
    }

    /// Fields that can be edited on the issue, keyed by field id.
    pub async fn edit_meta(&self, key: &str) -> Result<Map<String, Value>> {
        let answer = self
            .client
            .raw()
            .get(&format!("issue/{}/editmeta", key), &Value::Null)
            .await?;
        Ok(match answer {
            Value::Object(mut map) => match map.remove("fields") {
                Some(Value::Object(fields)) => fields,
                _ => Map::new(),
            },
            _ => Map::new(),
        })
    }

    /// Find issues with JQL.
    ///
    /// The result list is stored in the client's response cache.
    pub async fn search(
        &self,
        jql: &str,
        fields: &[&str],
        expand: &[&str],
        max_results: Option<u32>,
        start_at: u32,
    ) -> Result<Vec<Value>> {
        let max_results = max_results.unwrap_or(SEARCH_MAX_RESULTS);
        let key = compose_pairs_key(&[
            ("jql", jql.to_string()),
            ("startAt", start_at.to_string()),
            ("maxResults", max_results.to_string()),
            ("validateQuery", "true".to_string()),
            ("fields", fields.join(",")),
            ("expand", expand.join(",")),
        ]);

        let cache = self.client.raw().cache();
        if let Some(Value::Array(issues)) = cache.get(&key) {
            trace!(jql, "Using cached search results");
            return Ok(issues);
        }

        let answer = self
            .client
            .search(jql, fields, expand, max_results, start_at, true)
            .await?;
        let issues = take_list(answer, "issues");

        if let Err(e) = cache.set(&key, Value::Array(issues.clone())) {
            warn!("Failed to cache search results: {}", e);
        }
        debug!(jql, count = issues.len(), "Search finished");
        Ok(issues)
    }

    pub fn comment(&self) -> CommentSection<'a> {
        CommentSection {
            client: self.client,
        }
    }

    pub fn watchers(&self) -> WatchersSection<'a> {
        WatchersSection {
            client: self.client,
        }
    }

    pub fn transitions(&self) -> TransitionsSection<'a> {
        TransitionsSection {
            client: self.client,
        }
    }

    pub fn attachments(&self) -> IssueAttachmentsSection<'a> {
        IssueAttachmentsSection {
            client: self.client,
        }
    }
}

/// Comments of an issue.
#[derive(Debug, Clone, Copy)]
pub struct CommentSection<'a> {
    client: &'a Client,
}

fn rendered_query(expand_rendered: bool) -> &'static str {
    if expand_rendered {
        "?expand=renderedBody"
    } else {
        ""
    }
}

impl<'a> CommentSection<'a> {
    /// Add a comment. `visibility` restricts it to a role or group.
    pub async fn create(
        &self,
        key: &str,
        body: &str,
        visibility: Option<Value>,
        expand_rendered: bool,
    ) -> Result<Value> {
        let mut args = Map::new();
        args.insert("body".into(), json!(body));
        if let Some(visibility) = visibility {
            args.insert("visibility".into(), visibility);
        }
        self.client
            .raw()
            .post(
                &format!("issue/{}/comment{}", key, rendered_query(expand_rendered)),
                Value::Object(args),
            )
            .await
    }

    pub async fn get(&self, key: &str, id: u64, expand_rendered: bool) -> Result<Value> {
        self.client
            .raw()
            .get(
                &format!("issue/{}/comment/{}", key, id),
                &json!({"expand": expand_rendered.then_some("renderedBody")}),
            )
            .await
    }

    /// List comments of an issue.
    pub async fn list(
        &self,
        key: &str,
        start_at: u32,
        max_results: Option<u32>,
        order_by: Option<&str>,
        expand_rendered: bool,
    ) -> Result<Vec<Value>> {
        let answer = self
            .client
            .raw()
            .get(
                &format!("issue/{}/comment", key),
                &json!({
                    "startAt": start_at,
                    "maxResults": max_results,
                    "orderBy": order_by,
                    "expand": expand_rendered.then_some("renderedBody"),
                }),
            )
            .await?;
        Ok(take_list(answer, "comments"))
    }

    pub async fn update(
        &self,
        key: &str,
        id: u64,
        body: &str,
        visibility: Option<Value>,
        expand_rendered: bool,
    ) -> Result<Value> {
        let mut args = Map::new();
        args.insert("body".into(), json!(body));
        if let Some(visibility) = visibility {
            args.insert("visibility".into(), visibility);
        }
        self.client
            .raw()
            .put(
                &format!("issue/{}/comment/{}{}", key, id, rendered_query(expand_rendered)),
                Value::Object(args),
            )
            .await
    }

    pub async fn delete(&self, key: &str, id: u64) -> Result<()> {
        self.client
            .raw()
            .delete(&format!("issue/{}/comment/{}", key, id), &Value::Null)
            .await?;
        Ok(())
    }
}

/// Watchers of an issue.
#[derive(Debug, Clone, Copy)]
pub struct WatchersSection<'a> {
    client: &'a Client,
}

impl<'a> WatchersSection<'a> {
    /// Start watching. JIRA expects the bare login as a JSON string.
    pub async fn add(&self, key: &str, login: &str) -> Result<()> {
        self.client
            .raw()
            .post(&format!("issue/{}/watchers", key), json!(login))
            .await?;
        Ok(())
    }

    pub async fn list(&self, key: &str) -> Result<Vec<Value>> {
        let answer = self
            .client
            .raw()
            .get(&format!("issue/{}/watchers", key), &Value::Null)
            .await?;
        Ok(take_list(answer, "watchers"))
    }

    pub async fn remove(&self, key: &str, login: &str) -> Result<()> {
        self.client
            .raw()
            .delete(
                &format!("issue/{}/watchers", key),
                &json!({"username": login}),
            )
            .await?;
        Ok(())
    }
}

/// Workflow transitions of an issue.
#[derive(Debug, Clone, Copy)]
pub struct TransitionsSection<'a> {
    client: &'a Client,
}

impl<'a> TransitionsSection<'a> {
    /// Transitions available for the issue, with their screen fields when asked.
    pub async fn list(&self, key: &str, with_fields: bool) -> Result<Vec<Value>> {
        let answer = self
            .client
            .raw()
            .get(
                &format!("issue/{}/transitions", key),
                &json!({"expand": with_fields.then_some("transitions.fields")}),
            )
            .await?;
        Ok(take_list(answer, "transitions"))
    }

    /// Perform a transition.
    pub async fn perform(
        &self,
        key: &str,
        transition_id: u64,
        fields: Option<Map<String, Value>>,
        update: Option<Map<String, Value>>,
    ) -> Result<()> {
        let mut args = Map::new();
        args.insert(
            "transition".into(),
            json!({"id": transition_id.to_string()}),
        );
        if let Some(fields) = fields.filter(|f| !f.is_empty()) {
            args.insert("fields".into(), Value::Object(fields));
        }
        if let Some(update) = update.filter(|u| !u.is_empty()) {
            args.insert("update".into(), Value::Object(update));
        }

        self.client
            .raw()
            .post(&format!("issue/{}/transitions", key), Value::Object(args))
            .await?;
        Ok(())
    }

    /// Perform a transition, dropping the edits its screen does not allow.
    pub async fn perform_safe(
        &self,
        key: &str,
        transition_id: u64,
        fields: Option<Map<String, Value>>,
        update: Option<Map<String, Value>>,
    ) -> crate::Result<()> {
        let transitions = self.list(key, true).await?;
        let transition = transitions
            .iter()
            .find(|t| t.get("id").map(crate::api::types::parse_id) == Some(transition_id))
            .ok_or_else(|| {
                Error::transition(format!(
                    "Transition {} is not available for issue {}",
                    transition_id, key
                ))
            })?;

        let (fields, update) = filter_by_screen(transition, fields, update);
        self.perform(key, transition_id, fields, update).await?;
        Ok(())
    }

    /// Move the issue to the status named `name`.
    ///
    /// The transition is looked up by its own name or by its target status.
    /// Unless `same_status` is set, an issue already in that status is an
    /// `Error::Transition` and nothing is sent.
    pub async fn step(
        &self,
        key: &str,
        name: &str,
        fields: Option<Map<String, Value>>,
        update: Option<Map<String, Value>>,
        safe: bool,
        same_status: bool,
    ) -> crate::Result<()> {
        if !same_status {
            let issue = self
                .client
                .raw()
                .get(&format!("issue/{}", key), &json!({"fields": "status"}))
                .await?;
            let current = issue
                .pointer("/fields/status/name")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if current == name {
                debug!(key, status = name, "Issue already in target status");
                return Err(Error::transition(format!(
                    "Issue {} is already in status '{}'",
                    key, name
                )));
            }
        }

        let transitions = self.list(key, safe).await?;
        let transition = transitions
            .iter()
            .find(|t| {
                t.get("name").and_then(Value::as_str) == Some(name)
                    || t.pointer("/to/name").and_then(Value::as_str) == Some(name)
            })
            .ok_or_else(|| {
                Error::transition(format!(
                    "Transition '{}' is not available for issue {}",
                    name, key
                ))
            })?;
        let transition_id = transition
            .get("id")
            .map(crate::api::types::parse_id)
            .unwrap_or(0);

        let (fields, update) = if safe {
            filter_by_screen(transition, fields, update)
        } else {
            (fields, update)
        };
        self.perform(key, transition_id, fields, update).await?;
        Ok(())
    }
}

/// Keep only the edits of fields present on the transition screen.
fn filter_by_screen(
    transition: &Value,
    fields: Option<Map<String, Value>>,
    update: Option<Map<String, Value>>,
) -> (Option<Map<String, Value>>, Option<Map<String, Value>>) {
    let allowed = transition.get("fields").and_then(Value::as_object);
    let keep = |map: Option<Map<String, Value>>| {
        map.map(|m| {
            m.into_iter()
                .filter(|(field, _)| allowed.is_some_and(|a| a.contains_key(field)))
                .collect::<Map<String, Value>>()
        })
    };
    (keep(fields), keep(update))
}

/// Attachments of an issue.
#[derive(Debug, Clone, Copy)]
pub struct IssueAttachmentsSection<'a> {
    client: &'a Client,
}

impl<'a> IssueAttachmentsSection<'a> {
    pub async fn list(&self, key: &str) -> Result<Vec<Value>> {
        let issue = self
            .client
            .raw()
            .get(&format!("issue/{}", key), &json!({"fields": "attachment"}))
            .await?;
        Ok(issue
            .pointer("/fields/attachment")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// Upload a file.
    ///
    /// `name` defaults to the file name and `mime` is guessed from the
    /// extension. Returns the metadata of the created attachment.
    pub async fn create(
        &self,
        key: &str,
        path: &Path,
        name: Option<&str>,
        mime: Option<&str>,
    ) -> Result<Value> {
        let file_name = match name {
            Some(name) => name.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| ApiError::InvalidUrl(format!("not a file path: {}", path.display())))?,
        };
        let mime = match mime {
            Some(mime) => mime.to_string(),
            None => mime_guess::from_path(path)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        };

        let answer = self
            .client
            .raw()
            .multipart(
                &format!("issue/{}/attachments", key),
                vec![FilePart {
                    field: "file".to_string(),
                    path: path.to_path_buf(),
                    file_name,
                    mime,
                }],
            )
            .await?;

        Ok(super::into_list(answer)
            .into_iter()
            .next()
            .unwrap_or(Value::Null))
    }
}
