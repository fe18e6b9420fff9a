//! JQL autocomplete suggestions.

use serde_json::{json, Value};

use super::take_list;
use crate::api::{Client, Result};

/// JQL helpers.
#[derive(Debug, Clone, Copy)]
pub struct JqlSection<'a> {
    client: &'a Client,
}

impl<'a> JqlSection<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Autocomplete suggestions for the value of a field.
    pub async fn field_suggestions(
        &self,
        field_name: &str,
        field_value: Option<&str>,
        predicate_name: Option<&str>,
        predicate_value: Option<&str>,
    ) -> Result<Vec<Value>> {
        let answer = self
            .client
            .raw()
            .get(
                "jql/autocompletedata/suggestions",
                &json!({
                    "fieldName": field_name,
                    "fieldValue": field_value,
                    "predicateName": predicate_name,
                    "predicateValue": predicate_value,
                }),
            )
            .await?;
        Ok(take_list(answer, "results"))
    }
}
