//! Numeric custom fields.

use serde_json::{json, Value};

use super::CustomField;
use crate::error::Result;
use crate::model::Issue;

/// Numeric field.
#[derive(Debug, Clone)]
pub struct NumberField {
    field: CustomField,
}

impl NumberField {
    pub fn new(field: CustomField) -> Self {
        Self { field }
    }

    pub fn field(&self) -> &CustomField {
        &self.field
    }

    pub async fn value(&self, issue: &mut Issue) -> Result<Option<f64>> {
        Ok(self.field.raw_value(issue).await?.and_then(|v| v.as_f64()))
    }

    pub fn generate_setter(value: Option<f64>) -> Value {
        json!([{"set": value}])
    }

    pub fn set_value(&self, issue: &mut Issue, value: Option<f64>) {
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
        let (client, _transport) = test_client();
        let mut issue = loaded_issue(&client, json!({"customfield_1": 2.5}));
        let points = NumberField::new(CustomField::new("customfield_1", "Story Points"));

        assert_eq!(points.value(&mut issue).await.unwrap(), Some(2.5));
        points.set_value(&mut issue, Some(3.0));
        assert_eq!(issue.pending_edit("customfield_1"), Some(&json!([{"set": 3.0}])));
        assert_eq!(NumberField::generate_setter(None), json!([{"set": null}]));
    }
}
