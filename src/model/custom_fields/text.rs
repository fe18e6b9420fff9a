//! Single and multi line text custom fields.

use serde_json::{json, Value};

use super::CustomField;
use crate::error::Result;
use crate::model::Issue;

/// Single or multi line text field.
#[derive(Debug, Clone)]
pub struct TextField {
    field: CustomField,
}

impl TextField {
    pub fn new(field: CustomField) -> Self {
        Self { field }
    }

    pub fn field(&self) -> &CustomField {
        &self.field
    }

    /// Field text, empty when unset.
    pub async fn value(&self, issue: &mut Issue) -> Result<String> {
        Ok(self
            .field
            .raw_value(issue)
            .await?
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default())
    }

    pub fn generate_setter(value: Option<&str>) -> Value {
        json!([{"set": value}])
    }

    /// `None` clears the field.
    pub fn set_value(&self, issue: &mut Issue, value: Option<&str>) {
        self.field.edit(issue, Self::generate_setter(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::test_client;
    use crate::model::custom_fields::tests::loaded_issue;

    #[tokio::test]
    async fn test_value_and_setter() {
        let (client, transport) = test_client();
        let mut issue = loaded_issue(&client, json!({"customfield_1": "notes", "customfield_2": null}));

        let notes = TextField::new(CustomField::new("customfield_1", "Notes"));
        let empty = TextField::new(CustomField::new("customfield_2", "Other"));
        assert_eq!(notes.value(&mut issue).await.unwrap(), "notes");
        assert_eq!(empty.value(&mut issue).await.unwrap(), "");

        notes.set_value(&mut issue, Some("new"));
        empty.set_value(&mut issue, None);
        assert_eq!(issue.pending_edit("customfield_1"), Some(&json!([{"set": "new"}])));
        assert_eq!(issue.pending_edit("customfield_2"), Some(&json!([{"set": null}])));
        assert!(transport.sent().is_empty());
    }
}
