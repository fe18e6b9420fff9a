//! Checkbox custom fields.

use serde_json::{json, Value};

use super::{format_items, option_string, CustomField};
use crate::error::{Error, Result};
use crate::model::Issue;

/// Values of a list of option objects.
fn option_values(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| option_string(v, "value")).collect())
        .unwrap_or_default()
}

fn checked_setter(values: &[String]) -> Value {
    let options: Vec<Value> = values.iter().map(|v| json!({"value": v})).collect();
    json!([{"set": options}])
}

/// Options checked now: the pending edit if any, the loaded value otherwise.
async fn checked_values(field: &CustomField, issue: &mut Issue) -> Result<Vec<String>> {
    if let Some(pending) = field.pending_set(issue) {
        return Ok(option_values(Some(pending)));
    }
    Ok(option_values(field.raw_value(issue).await?.as_ref()))
}

/// Multiple checkboxes.
#[derive(Debug, Clone)]
pub struct CheckboxField {
    field: CustomField,
    items: Vec<String>,
}

impl CheckboxField {
    /// `items` are the available checkboxes. An empty list disables
    /// validation.
    pub fn new(field: CustomField, items: Vec<String>) -> Self {
        Self { field, items }
    }

    pub fn field(&self) -> &CustomField {
        &self.field
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Checked options as saved in JIRA.
    pub async fn value(&self, issue: &mut Issue) -> Result<Vec<String>> {
        Ok(option_values(self.field.raw_value(issue).await?.as_ref()))
    }

    pub fn generate_setter(values: &[&str]) -> Value {
        let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        checked_setter(&values)
    }

    fn validate(&self, values: &[&str]) -> Result<()> {
        if self.items.is_empty() {
            return Ok(());
        }
        match values.iter().find(|v| !self.items.iter().any(|item| item == *v)) {
            Some(unknown) => Err(Error::custom_field(format!(
                "Can't check '{}' item. Available items for field '{}' are: {}",
                unknown,
                self.field.name(),
                format_items(&self.items)
            ))),
            None => Ok(()),
        }
    }

    /// Check exactly the given options.
    pub fn set_value(&self, issue: &mut Issue, values: &[&str]) -> Result<()> {
        self.validate(values)?;
        self.field.edit(issue, Self::generate_setter(values));
        Ok(())
    }

    pub async fn is_checked(&self, issue: &mut Issue, value: &str) -> Result<bool> {
        Ok(checked_values(&self.field, issue).await?.iter().any(|v| v == value))
    }

    pub async fn check(&self, issue: &mut Issue, values: &[&str]) -> Result<()> {
        self.validate(values)?;
        let mut checked = checked_values(&self.field, issue).await?;
        for value in values {
            if !checked.iter().any(|v| v == value) {
                checked.push(value.to_string());
            }
        }
        self.field.edit(issue, checked_setter(&checked));
        Ok(())
    }

    pub async fn uncheck(&self, issue: &mut Issue, values: &[&str]) -> Result<()> {
        let mut checked = checked_values(&self.field, issue).await?;
        checked.retain(|v| !values.contains(&v.as_str()));
        self.field.edit(issue, checked_setter(&checked));
        Ok(())
    }
}

/// A checkbox field with one option, used as a flag.
#[derive(Debug, Clone)]
pub struct SingleCheckboxField {
    field: CustomField,
    item: String,
}

impl SingleCheckboxField {
    pub fn new(field: CustomField, item: &str) -> Self {
        Self {
            field,
            item: item.to_string(),
        }
    }

    pub fn field(&self) -> &CustomField {
        &self.field
    }

    /// The checked option, empty when unchecked.
    pub async fn value(&self, issue: &mut Issue) -> Result<String> {
        Ok(checked_values(&self.field, issue)
            .await?
            .into_iter()
            .next()
            .unwrap_or_default())
    }

    pub async fn is_checked(&self, issue: &mut Issue) -> Result<bool> {
        Ok(!checked_values(&self.field, issue).await?.is_empty())
    }

    pub fn set_checked(&self, issue: &mut Issue, checked: bool) {
        let values = if checked { vec![self.item.clone()] } else { Vec::new() };
        self.field.edit(issue, checked_setter(&values));
    }
}
