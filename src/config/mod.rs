//! Configuration management for jira-client.
//!
//! This module handles loading, saving, and managing the client configuration:
//! connection profiles and the settings shared by all of them.

mod profile;
mod settings;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use profile::{Profile, ENV_API_PREFIX, ENV_EMAIL, ENV_PROFILE_NAME, ENV_TOKEN, ENV_URL};
pub use settings::{CacheKind, CacheSettings, Settings};

/// Configuration file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Application directory name.
const APP_DIR: &str = "jira-client";

/// Errors that can occur while handling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    NoConfigDir,

    #[error("failed to create configuration directory: {0}")]
    CreateDirError(std::io::Error),

    #[error("failed to read configuration file: {0}")]
    ReadError(std::io::Error),

    #[error("failed to write configuration file: {0}")]
    WriteError(std::io::Error),

    #[error("failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    ValidationError(String),

    #[error("profile '{0}' not found")]
    ProfileNotFound(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Complete configuration: settings plus connection profiles.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Config {
    /// Default location of the configuration file.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load configuration from the default location.
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load configuration from `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;

        debug!(
            path = %path.display(),
            profiles = config.profiles.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::CreateDirError)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(ConfigError::WriteError)?;
        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Validate every profile and reject duplicate names.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for profile in &self.profiles {
            profile.validate()?;
            if !names.insert(profile.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }

        if let Some(default) = &self.settings.default_profile {
            if !self.profiles.is_empty() && !names.contains(default.as_str()) {
                return Err(ConfigError::ProfileNotFound(default.clone()));
            }
        }
        Ok(())
    }

    /// Find a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))
    }

    /// The default profile: the configured one, or the first profile.
    pub fn default_profile(&self) -> Option<&Profile> {
        match &self.settings.default_profile {
            Some(name) => self.profiles.iter().find(|p| &p.name == name),
            None => self.profiles.first(),
        }
    }

    /// Profile to connect with: `name` when given, then the environment
    /// profile, then the default one.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<Profile> {
        if let Some(name) = name {
            return self.profile(name).cloned();
        }
        if let Some(profile) = Profile::from_env()? {
            debug!("Using profile from environment");
            return Ok(profile);
        }
        self.default_profile()
            .cloned()
            .ok_or_else(|| ConfigError::ValidationError("no profile configured".to_string()))
    }

    /// Add a profile, rejecting duplicates.
    pub fn add_profile(&mut self, profile: Profile) -> Result<()> {
        profile.validate()?;
        if self.profiles.iter().any(|p| p.name == profile.name) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate profile name '{}'",
                profile.name
            )));
        }
        self.profiles.push(profile);
        Ok(())
    }

    /// Remove a profile by name.
    pub fn remove_profile(&mut self, name: &str) -> Result<Profile> {
        let index = self
            .profiles
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))?;

        if self.settings.default_profile.as_deref() == Some(name) {
            self.settings.default_profile = None;
        }
        Ok(self.profiles.remove(index))
    }
}
