//! User picker custom fields.

use serde_json::{json, Value};
use tracing::debug;

use super::{option_string, CustomField};
use crate::api::Client;
use crate::error::{Error, Result};
use crate::model::{Issue, User};

/// First user found for `login`.
async fn find_user(client: &Client, login: &str) -> Result<Option<User>> {
    Ok(User::search(client, login).await?.into_iter().next())
}

/// A field holding one user.
#[derive(Debug, Clone)]
pub struct SingleUserField {
    field: CustomField,
}

impl SingleUserField {
    pub fn new(field: CustomField) -> Self {
        Self { field }
    }

    pub fn field(&self) -> &CustomField {
        &self.field
    }

    pub async fn value(&self, issue: &mut Issue) -> Result<Option<User>> {
        let client = issue.client().clone();
        match self.field.raw_value(issue).await? {
            Some(value) => Ok(Some(User::from_value(&client, value)?)),
            None => Ok(None),
        }
    }

    pub fn generate_setter(login: Option<&str>) -> Value {
        match login {
            Some(login) => json!([{"set": {"name": login}}]),
            None => json!([{"set": null}]),
        }
    }

    /// Set the field to the user found by `login`; `None` clears it.
    pub async fn set_value(&self, issue: &mut Issue, login: Option<&str>) -> Result<()> {
        let Some(login) = login else {
            self.field.edit(issue, Self::generate_setter(None));
            return Ok(());
        };

        let user = find_user(issue.client(), login).await?.ok_or_else(|| {
            Error::custom_field(format!(
                "User '{}' not found in Jira. Can't change '{}' field value.",
                login,
                self.field.name()
            ))
        })?;
        self.field.edit(issue, Self::generate_setter(Some(user.name())));
        Ok(())
    }
}

/// A field holding a list of users.
///
/// Changes build on the pending edit of the field, so several calls can be
/// combined before the issue is saved.
#[derive(Debug, Clone)]
pub struct MultiUserField {
    field: CustomField,
}

impl MultiUserField {
    pub fn new(field: CustomField) -> Self {
        Self { field }
    }

    pub fn field(&self) -> &CustomField {
        &self.field
    }

    /// Users saved in JIRA.
    pub async fn value(&self, issue: &mut Issue) -> Result<Vec<User>> {
        let client = issue.client().clone();
        match self.field.raw_value(issue).await? {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|value| User::from_value(&client, value))
                .collect(),
            _ => Ok(Vec::new()),
        }
    }

    /// Logins selected now, pending edits included.
    pub async fn selected(&self, issue: &mut Issue) -> Result<Vec<String>> {
        let names = |value: &Value| -> Vec<String> {
            value
                .as_array()
                .map(|items| items.iter().filter_map(|v| option_string(v, "name")).collect())
                .unwrap_or_default()
        };
        if let Some(pending) = self.field.pending_set(issue) {
            return Ok(names(pending));
        }
        Ok(self
            .field
            .raw_value(issue)
            .await?
            .map(|value| names(&value))
            .unwrap_or_default())
    }

    pub fn generate_setter(logins: &[String]) -> Value {
        let users: Vec<Value> = logins.iter().map(|login| json!({"name": login})).collect();
        json!([{"set": users}])
    }

    async fn resolve(&self, client: &Client, login: &str) -> Result<String> {
        match find_user(client, login).await? {
            Some(user) => Ok(user.name().to_string()),
            None => Err(Error::custom_field(format!(
                "User '{}' not found in Jira. Can't add it to '{}' field.",
                login,
                self.field.name()
            ))),
        }
    }

    /// Replace the selection with the users found by `logins`.
    pub async fn set_value(&self, issue: &mut Issue, logins: &[&str]) -> Result<()> {
        let mut selected: Vec<String> = Vec::with_capacity(logins.len());
        for login in logins {
            let name = self.resolve(issue.client(), login).await?;
            if !selected.contains(&name) {
                selected.push(name);
            }
        }
        self.field.edit(issue, Self::generate_setter(&selected));
        Ok(())
    }

    pub async fn add_user(&self, issue: &mut Issue, login: &str) -> Result<()> {
        let mut selected = self.selected(issue).await?;
        if selected.iter().any(|name| name == login) {
            return Ok(());
        }
        let name = self.resolve(issue.client(), login).await?;
        if !selected.contains(&name) {
            debug!(field = %self.field.id(), user = %name, "Adding user to field");
            selected.push(name);
        }
        self.field.edit(issue, Self::generate_setter(&selected));
        Ok(())
    }

    pub async fn remove_user(&self, issue: &mut Issue, login: &str) -> Result<()> {
        let mut selected = self.selected(issue).await?;
        selected.retain(|name| name != login);
        self.field.edit(issue, Self::generate_setter(&selected));
        Ok(())
    }

    pub async fn has_user(&self, issue: &mut Issue, login: &str) -> Result<bool> {
        Ok(self.selected(issue).await?.iter().any(|name| name == login))
    }

    pub fn clear(&self, issue: &mut Issue) {
        self.field.edit(issue, Self::generate_setter(&[]));
    }
}
