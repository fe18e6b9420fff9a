//! Client settings shared by all profiles.

use serde::{Deserialize, Serialize};

/// Which response cache the client uses.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    /// No caching.
    #[default]
    None,
    /// In-process memoization for the lifetime of the client.
    Memory,
    /// JSON files with a time-to-live under the platform cache directory.
    Disk,
}

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheSettings {
    pub kind: CacheKind,
    /// Time-to-live of disk entries in minutes.
    pub ttl_minutes: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            kind: CacheKind::None,
            ttl_minutes: 30,
        }
    }
}

/// Client-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// The name of the default profile to use.
    pub default_profile: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Extra attempts for transient failures.
    pub max_retries: u32,
    pub cache: CacheSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_profile: None,
            timeout_secs: crate::api::DEFAULT_TIMEOUT_SECS,
            max_retries: 0,
            cache: CacheSettings::default(),
        }
    }
}
