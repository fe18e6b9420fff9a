//! Typed access to custom fields.
//!
//! A [`CustomField`] names a field; the kinds below know how its value is
//! shaped and how to build the update operation that changes it. Values are
//! read from and edits recorded on an [`Issue`], so they are saved together
//! with the issue's other edits.

mod checkbox;
mod number;
mod select;
mod text;
mod user;

pub use checkbox::{CheckboxField, SingleCheckboxField};
pub use number::NumberField;
pub use select::{RadioField, SingleSelectField};
pub use text::TextField;
pub use user::{MultiUserField, SingleUserField};

use std::fmt;

use serde_json::Value;

use super::issue::Issue;
use crate::api::types::{decode, FieldInfo, FieldSchema};
use crate::api::Client;
use crate::error::Result;

const CUSTOM_FIELD_PREFIX: &str = "customfield_";
const CUSTOM_TYPE_PREFIX: &str = "com.atlassian.jira.plugin.system.customfieldtypes:";

/// Value shapes supported by the typed wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomFieldKind {
    Text,
    Number,
    SingleSelect,
    Radio,
    Checkbox,
    SingleCheckbox,
    SingleUser,
    MultiUser,
}

impl CustomFieldKind {
    /// Pick the kind for a field schema. Unknown plugin types fall back to
    /// the plain schema type.
    pub fn detect(schema: &FieldSchema) -> Option<Self> {
        let plugin = schema
            .custom
            .as_deref()
            .map(|c| c.strip_prefix(CUSTOM_TYPE_PREFIX).unwrap_or(c));
        match plugin {
            Some("textfield" | "textarea" | "url") => return Some(Self::Text),
            Some("float") => return Some(Self::Number),
            Some("select") => return Some(Self::SingleSelect),
            Some("radiobuttons") => return Some(Self::Radio),
            Some("multicheckboxes") => return Some(Self::Checkbox),
            Some("userpicker") => return Some(Self::SingleUser),
            Some("multiuserpicker") => return Some(Self::MultiUser),
            _ => {}
        }

        match (schema.kind.as_str(), schema.items.as_deref()) {
            ("string", _) => Some(Self::Text),
            ("number", _) => Some(Self::Number),
            ("user", _) => Some(Self::SingleUser),
            ("array", Some("user")) => Some(Self::MultiUser),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::SingleSelect => "single select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::SingleCheckbox => "single checkbox",
            Self::SingleUser => "single user",
            Self::MultiUser => "multi user",
        }
    }
}

impl fmt::Display for CustomFieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A custom field definition.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomField {
    id: String,
    name: String,
    kind: Option<CustomFieldKind>,
}

impl CustomField {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: None,
        }
    }

    pub fn from_info(info: &FieldInfo) -> Self {
        Self {
            id: info.id.clone(),
            name: info.name.clone(),
            kind: info.schema.as_ref().and_then(CustomFieldKind::detect),
        }
    }

    /// Custom field definitions of the JIRA instance.
    pub async fn list(client: &Client) -> Result<Vec<Self>> {
        client
            .field()
            .custom()
            .await?
            .into_iter()
            .map(|value| -> Result<Self> {
                let info: FieldInfo = decode(value)?;
                Ok(Self::from_info(&info))
            })
            .collect()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind detected from the field schema, if the field was listed.
    pub fn kind(&self) -> Option<CustomFieldKind> {
        self.kind
    }

    /// Numeric part of `customfield_NNNNN`.
    pub fn custom_id(&self) -> Option<u64> {
        self.id.strip_prefix(CUSTOM_FIELD_PREFIX)?.parse().ok()
    }

    /// Load an issue with only this field.
    pub async fn load_issue(&self, client: &Client, key: &str) -> Result<Issue> {
        Issue::by_key(client, key, &["key", self.id.as_str()], &[]).await
    }

    /// Raw field value, `None` when empty.
    pub async fn raw_value(&self, issue: &mut Issue) -> Result<Option<Value>> {
        issue.field_value(&self.id).await
    }

    pub async fn is_empty(&self, issue: &mut Issue) -> Result<bool> {
        Ok(self.raw_value(issue).await?.is_none())
    }

    pub async fn is_editable(&self, issue: &mut Issue) -> Result<bool> {
        issue.is_editable(&self.id).await
    }

    pub async fn rendered_value(&self, issue: &mut Issue) -> Result<Option<String>> {
        issue.rendered_field(&self.id).await
    }

    /// Record update operations for this field on the issue.
    pub fn edit(&self, issue: &mut Issue, update: Value) {
        issue.edit(&self.id, update);
    }

    /// Operand of a pending `set` operation, if one was recorded.
    fn pending_set<'a>(&self, issue: &'a Issue) -> Option<&'a Value> {
        issue
            .pending_edit(&self.id)?
            .as_array()?
            .iter()
            .find_map(|operation| operation.get("set"))
    }
}

impl fmt::Display for CustomField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// String of `key` inside an option object such as `{"value": "Red"}`.
fn option_string(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn format_items(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("'{}'", item))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::client::tests::{api_path, test_client};
    use serde_json::json;

    /// An issue already loaded with the given fields.
    pub(crate) fn loaded_issue(client: &Client, fields: Value) -> Issue {
        let info = decode(json!({"id": "10001", "key": "TEST-1", "fields": fields})).unwrap();
        Issue::from_info(client, info, &[], &[]).unwrap()
    }

    fn schema(value: Value) -> FieldSchema {
        decode(value).unwrap()
    }

    #[test]
    fn test_detect_kind() {
        let cases = [
            (json!({"type": "string", "custom": "com.atlassian.jira.plugin.system.customfieldtypes:textarea"}), Some(CustomFieldKind::Text)),
            (json!({"type": "number", "custom": "com.atlassian.jira.plugin.system.customfieldtypes:float"}), Some(CustomFieldKind::Number)),
            (json!({"type": "option", "custom": "com.atlassian.jira.plugin.system.customfieldtypes:select"}), Some(CustomFieldKind::SingleSelect)),
            (json!({"type": "option", "custom": "com.atlassian.jira.plugin.system.customfieldtypes:radiobuttons"}), Some(CustomFieldKind::Radio)),
            (json!({"type": "array", "items": "option", "custom": "com.atlassian.jira.plugin.system.customfieldtypes:multicheckboxes"}), Some(CustomFieldKind::Checkbox)),
            (json!({"type": "user", "custom": "com.atlassian.jira.plugin.system.customfieldtypes:userpicker"}), Some(CustomFieldKind::SingleUser)),
            (json!({"type": "array", "items": "user", "custom": "com.example:people"}), Some(CustomFieldKind::MultiUser)),
            (json!({"type": "string", "custom": "com.example:secret"}), Some(CustomFieldKind::Text)),
            (json!({"type": "date"}), None),
        ];
        for (value, expected) in cases {
            assert_eq!(CustomFieldKind::detect(&schema(value.clone())), expected, "{}", value);
        }
    }

    #[test]
    fn test_custom_id() {
        assert_eq!(CustomField::new("customfield_10010", "Team").custom_id(), Some(10010));
        assert_eq!(CustomField::new("summary", "Summary").custom_id(), None);
    }

    #[tokio::test]
    async fn test_list_detects_kinds() {
        let (client, transport) = test_client();
        transport.push_json(
            200,
            json!([
                {"id": "summary", "name": "Summary", "custom": false},
                {
                    "id": "customfield_10010",
                    "name": "Team",
                    "custom": true,
                    "schema": {"type": "option", "custom": "com.atlassian.jira.plugin.system.customfieldtypes:select", "customId": 10010}
                }
            ]),
        );

        let fields = CustomField::list(&client).await.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].id(), "customfield_10010");
        assert_eq!(fields[0].kind(), Some(CustomFieldKind::SingleSelect));
        assert_eq!(fields[0].to_string(), "Team (customfield_10010)");
    }

    #[tokio::test]
    async fn test_load_issue_requests_one_field() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({"key": "TEST-1", "fields": {"customfield_10010": "abc"}}));

        let field = CustomField::new("customfield_10010", "Team");
        let mut issue = field.load_issue(&client, "TEST-1").await.unwrap();
        assert_eq!(field.raw_value(&mut issue).await.unwrap(), Some(json!("abc")));
        assert!(!field.is_empty(&mut issue).await.unwrap());
        assert_eq!(
            api_path(&transport.sent()[0].url),
            "issue/TEST-1?fields=key%2Ccustomfield_10010"
        );
    }
}
