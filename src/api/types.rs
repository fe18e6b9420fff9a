//! JIRA API response types.
//!
//! These types model the JSON objects the REST API returns for the entities
//! wrapped by [`crate::model`]. Most fields are optional because JIRA omits
//! data in nested objects (e.g. users inside comments have no groups, components
//! inside issues have no project id).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Deserialize an id that JIRA sends either as a string or as a number.
pub fn id_from_any<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_id(&value))
}

/// Numeric value of an id in a JSON value (`0` when absent or malformed).
pub fn parse_id(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_null()).map(|v| parse_id(&v)))
}

fn default_true() -> bool {
    true
}

/// A JIRA user.
///
/// Returned by `GET user` and embedded in issues, comments, components.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(rename = "self", default)]
    pub self_url: String,
    #[serde(default)]
    pub key: Option<String>,
    /// Login of the user on JIRA Server.
    #[serde(default)]
    pub name: Option<String>,
    /// Account id used by JIRA Cloud instead of `name`.
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub display_name: String,
    /// Absent in some responses (e.g. inside components).
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Avatar URLs keyed by size ("48x48", "32x32", ...).
    #[serde(default)]
    pub avatar_urls: HashMap<String, String>,
    /// Present only when requested with `expand=groups`.
    #[serde(default)]
    pub groups: Option<GroupItems>,
}

impl UserInfo {
    /// Login of the user, falling back to the account id.
    pub fn login(&self) -> Option<&str> {
        self.name.as_deref().or(self.account_id.as_deref())
    }
}

/// Expanded list of a user's groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupItems {
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub items: Vec<GroupInfo>,
}

/// A JIRA group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupInfo {
    pub name: String,
    #[serde(rename = "self", default)]
    pub self_url: String,
}

/// A project component.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInfo {
    #[serde(deserialize_with = "id_from_any", default)]
    pub id: u64,
    #[serde(rename = "self", default)]
    pub self_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Project key.
    #[serde(default)]
    pub project: Option<String>,
    #[serde(deserialize_with = "optional_id", default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub lead: Option<UserInfo>,
    #[serde(default)]
    pub assignee_type: Option<String>,
    #[serde(default)]
    pub assignee: Option<UserInfo>,
}

/// A project version.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    #[serde(deserialize_with = "id_from_any", default)]
    pub id: u64,
    #[serde(rename = "self", default)]
    pub self_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "optional_id", default)]
    pub project_id: Option<u64>,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub released: bool,
    #[serde(default)]
    pub overdue: bool,
}

/// An issue comment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentInfo {
    #[serde(deserialize_with = "id_from_any", default)]
    pub id: u64,
    #[serde(rename = "self", default)]
    pub self_url: String,
    #[serde(default)]
    pub body: String,
    /// Present only when requested with `expand=renderedBody`.
    #[serde(default)]
    pub rendered_body: Option<String>,
    #[serde(default)]
    pub author: Option<UserInfo>,
    #[serde(default)]
    pub update_author: Option<UserInfo>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub visibility: Option<Value>,
}

/// A link between two issues.
///
/// Inside an issue's `issuelinks` field only the opposite end is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkInfo {
    #[serde(deserialize_with = "id_from_any", default)]
    pub id: u64,
    #[serde(rename = "self", default)]
    pub self_url: String,
    #[serde(rename = "type", default)]
    pub link_type: LinkTypeInfo,
    #[serde(default)]
    pub inward_issue: Option<Value>,
    #[serde(default)]
    pub outward_issue: Option<Value>,
}

/// A link type, e.g. "Blocks" with "is blocked by" / "blocks".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LinkTypeInfo {
    #[serde(deserialize_with = "id_from_any", default)]
    pub id: u64,
    #[serde(rename = "self", default)]
    pub self_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inward: String,
    #[serde(default)]
    pub outward: String,
}

/// An attached file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInfo {
    #[serde(deserialize_with = "id_from_any", default)]
    pub id: u64,
    #[serde(rename = "self", default)]
    pub self_url: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
    /// Download link.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub author: Option<UserInfo>,
}

/// An issue status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    #[serde(deserialize_with = "id_from_any", default)]
    pub id: u64,
    #[serde(rename = "self", default)]
    pub self_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub status_category: Option<StatusCategoryInfo>,
}

impl fmt::Display for StatusInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Category of a status (To Do, In Progress, Done).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCategoryInfo {
    #[serde(deserialize_with = "id_from_any", default)]
    pub id: u64,
    #[serde(rename = "self", default)]
    pub self_url: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color_name: String,
}

/// An issue priority.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriorityInfo {
    #[serde(deserialize_with = "id_from_any", default)]
    pub id: u64,
    #[serde(rename = "self", default)]
    pub self_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub status_color: Option<String>,
}

/// An issue resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResolutionInfo {
    #[serde(deserialize_with = "id_from_any", default)]
    pub id: u64,
    #[serde(rename = "self", default)]
    pub self_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// An issue type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueTypeInfo {
    #[serde(deserialize_with = "id_from_any", default)]
    pub id: u64,
    #[serde(rename = "self", default)]
    pub self_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub subtask: bool,
}

/// An issue security level.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SecurityLevelInfo {
    #[serde(deserialize_with = "id_from_any", default)]
    pub id: u64,
    #[serde(rename = "self", default)]
    pub self_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One record of the issue changelog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChangelogInfo {
    #[serde(deserialize_with = "id_from_any", default)]
    pub id: u64,
    #[serde(default)]
    pub author: Option<UserInfo>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub items: Vec<ChangeItemInfo>,
}

/// A single field change inside a changelog record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeItemInfo {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub fieldtype: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub from_string: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub to_string: Option<String>,
}

/// Changelog embedded with `expand=changelog`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogPage {
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub max_results: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub histories: Vec<ChangelogInfo>,
}

/// Schema of a field as reported by `GET field`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Element type for array fields.
    #[serde(default)]
    pub items: Option<String>,
    /// Plugin type of custom fields, e.g.
    /// `com.atlassian.jira.plugin.system.customfieldtypes:select`.
    #[serde(default)]
    pub custom: Option<String>,
    #[serde(default)]
    pub custom_id: Option<u64>,
    #[serde(default)]
    pub system: Option<String>,
}

/// Field definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub schema: Option<FieldSchema>,
}

/// A JIRA issue.
///
/// Field values are kept as raw JSON since custom fields differ per instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueInfo {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub key: String,
    #[serde(rename = "self", default)]
    pub self_url: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub changelog: Option<ChangelogPage>,
    #[serde(default)]
    pub rendered_fields: Option<Map<String, Value>>,
}

impl IssueInfo {
    /// Value of an issue field, `None` for absent or null fields.
    pub fn field(&self, field_id: &str) -> Option<&Value> {
        self.fields.get(field_id).filter(|v| !v.is_null())
    }
}

/// Decode a JSON value into one of the types above.
pub fn decode<T: serde::de::DeserializeOwned>(value: Value) -> super::Result<T> {
    serde_json::from_value(value).map_err(|e| super::ApiError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_accept_strings_and_numbers() {
        let from_string: StatusInfo = serde_json::from_value(json!({"id": "10001", "name": "Open"})).unwrap();
        let from_number: StatusInfo = serde_json::from_value(json!({"id": 10001, "name": "Open"})).unwrap();
        assert_eq!(from_string.id, 10001);
        assert_eq!(from_number.id, 10001);
        assert_eq!(from_string.to_string(), "Open");
    }

    #[test]
    fn test_missing_id_defaults_to_zero() {
        let info: VersionInfo = serde_json::from_value(json!({"name": "1.0"})).unwrap();
        assert_eq!(info.id, 0);
        assert_eq!(info.project_id, None);
        assert!(!info.released);
    }

    #[test]
    fn test_user_login_falls_back_to_account_id() {
        let server: UserInfo = serde_json::from_value(json!({"name": "username"})).unwrap();
        let cloud: UserInfo =
            serde_json::from_value(json!({"accountId": "5cf8e44f98b1560e85999040"})).unwrap();

        assert_eq!(server.login(), Some("username"));
        assert_eq!(cloud.login(), Some("5cf8e44f98b1560e85999040"));
        assert!(server.active);
    }

    #[test]
    fn test_user_avatar_urls() {
        let user: UserInfo = serde_json::from_value(json!({
            "name": "jdoe",
            "avatarUrls": {"48x48": "https://jira/a48", "16x16": "https://jira/a16"}
        }))
        .unwrap();
        assert_eq!(user.avatar_urls.get("48x48").map(String::as_str), Some("https://jira/a48"));
        assert!(user.avatar_urls.get("32x32").is_none());
    }

    #[test]
    fn test_component_project_id_from_string() {
        let info: ComponentInfo =
            serde_json::from_value(json!({"id": "10000", "name": "Backend", "projectId": "123"}))
                .unwrap();
        assert_eq!(info.project_id, Some(123));
    }

    #[test]
    fn test_link_info_type_field() {
        let info: LinkInfo = serde_json::from_value(json!({
            "id": "5",
            "type": {"id": "100", "name": "Blocks", "inward": "is blocked by", "outward": "blocks"},
            "outwardIssue": {"key": "TEST-2"}
        }))
        .unwrap();
        assert_eq!(info.link_type.name, "Blocks");
        assert!(info.inward_issue.is_none());
        assert_eq!(info.outward_issue.unwrap()["key"], "TEST-2");
    }

    #[test]
    fn test_issue_info_field_skips_null() {
        let info: IssueInfo = serde_json::from_value(json!({
            "id": "10",
            "key": "TEST-1",
            "fields": {"summary": "Hello", "resolution": null}
        }))
        .unwrap();
        assert_eq!(info.field("summary"), Some(&json!("Hello")));
        assert!(info.field("resolution").is_none());
        assert!(info.field("missing").is_none());
    }

    #[test]
    fn test_changelog_items() {
        let page: ChangelogPage = serde_json::from_value(json!({
            "histories": [{
                "id": "1",
                "created": "2024-01-02T10:00:00.000+0000",
                "items": [{"field": "status", "fieldtype": "jira", "fromString": "Open", "toString": "Done"}]
            }]
        }))
        .unwrap();
        assert_eq!(page.histories[0].items[0].to_string.as_deref(), Some("Done"));
    }
}
