//! Connection profiles.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};
use crate::api::{self, DEFAULT_API_PREFIX};

/// Environment variable with the JIRA URL of the environment profile.
pub const ENV_URL: &str = "JIRA_CLIENT_URL";
/// Environment variable with the login email of the environment profile.
pub const ENV_EMAIL: &str = "JIRA_CLIENT_EMAIL";
/// Environment variable overriding the REST API root.
pub const ENV_API_PREFIX: &str = "JIRA_CLIENT_API_PREFIX";
/// Environment variable with an API token, checked before the keychain.
pub const ENV_TOKEN: &str = "JIRA_CLIENT_TOKEN";

/// Name of the profile built from environment variables.
pub const ENV_PROFILE_NAME: &str = "env";

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Connection details of one JIRA instance.
///
/// The API token is not part of the profile; it lives in the OS keychain
/// under the profile name or in [`ENV_TOKEN`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Unique, whitespace-free profile name.
    pub name: String,
    /// Root of the JIRA web UI, e.g. `https://jira.example.com/`.
    pub url: String,
    /// Login sent with every request.
    pub email: String,
    /// REST API root relative to `url`.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}

impl Profile {
    pub fn new(name: impl Into<String>, url: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            email: email.into(),
            api_prefix: default_api_prefix(),
        }
    }

    /// Use another API root, e.g. `rest/api/2/`.
    pub fn with_api_prefix(mut self, api_prefix: impl Into<String>) -> Self {
        self.api_prefix = api_prefix.into();
        self
    }

    /// Profile described by the `JIRA_CLIENT_*` variables, `None` when
    /// [`ENV_URL`] is unset.
    pub fn from_env() -> Result<Option<Self>> {
        let Some(url) = env_value(ENV_URL) else {
            return Ok(None);
        };
        let email = env_value(ENV_EMAIL).ok_or_else(|| {
            ConfigError::ValidationError(format!("{} is set but {} is not", ENV_URL, ENV_EMAIL))
        })?;

        let mut profile = Self::new(ENV_PROFILE_NAME, url, email);
        if let Some(prefix) = env_value(ENV_API_PREFIX) {
            profile.api_prefix = prefix;
        }
        profile.validate()?;
        Ok(Some(profile))
    }

    /// Check the profile before it is used or saved.
    ///
    /// # Errors
    ///
    /// `ConfigError::ValidationError` naming the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

        if self.name.is_empty() {
            return invalid("profile name cannot be empty".to_string());
        }
        if self.name.contains(char::is_whitespace) {
            return invalid(format!("profile name '{}' cannot contain whitespace", self.name));
        }
        if self.url.is_empty() {
            return invalid(format!("profile '{}': URL cannot be empty", self.name));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return invalid(format!(
                "profile '{}': URL must start with http:// or https://",
                self.name
            ));
        }
        if self.email.is_empty() {
            return invalid(format!("profile '{}': email cannot be empty", self.name));
        }
        if !self.email.contains('@') {
            return invalid(format!(
                "profile '{}': '{}' does not appear to be a valid email address",
                self.name, self.email
            ));
        }
        if self.api_prefix.trim_matches('/').is_empty() {
            return invalid(format!("profile '{}': API prefix cannot be empty", self.name));
        }
        Ok(())
    }

    /// API token: [`ENV_TOKEN`] if set, the keychain entry otherwise.
    pub fn token(&self) -> api::Result<String> {
        match env_value(ENV_TOKEN) {
            Some(token) => Ok(token),
            None => api::get_token(&self.name),
        }
    }

    /// Store the API token in the OS keychain.
    pub fn store_token(&self, token: &str) -> api::Result<()> {
        api::store_token(&self.name, token)
    }
}
