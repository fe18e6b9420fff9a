//! Read-only dictionary values referenced by issues.

use std::fmt;

use crate::api::types::{
    decode, IssueTypeInfo, PriorityInfo, ResolutionInfo, SecurityLevelInfo, StatusCategoryInfo,
    StatusInfo,
};
use crate::api::Client;
use crate::error::Result;

macro_rules! dictionary_value {
    ($(#[$meta:meta])* $name:ident, $info:ty, $section:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            client: Client,
            id: u64,
            original: Option<$info>,
        }

        impl $name {
            /// Wrap a value by id without loading it.
            pub fn new(client: &Client, id: u64) -> Self {
                Self {
                    client: client.clone(),
                    id,
                    original: None,
                }
            }

            pub fn from_info(client: &Client, info: $info) -> Self {
                Self {
                    client: client.clone(),
                    id: info.id,
                    original: Some(info),
                }
            }

            /// Wrap a value by id and load it.
            pub async fn get(client: &Client, id: u64) -> Result<Self> {
                let mut value = Self::new(client, id);
                value.load().await?;
                Ok(value)
            }

            pub(crate) fn from_value(client: &Client, value: serde_json::Value) -> Result<Self> {
                Ok(Self::from_info(client, decode(value)?))
            }

            async fn load(&mut self) -> Result<&$info> {
                let info = match self.original.take() {
                    Some(info) => info,
                    None => decode(self.client.$section().get(self.id, false).await?)?,
                };
                Ok(self.original.insert(info))
            }

            pub fn id(&self) -> u64 {
                self.id
            }

            /// Loaded data, if any.
            pub fn info(&self) -> Option<&$info> {
                self.original.as_ref()
            }

            pub async fn name(&mut self) -> Result<String> {
                Ok(self.load().await?.name.clone())
            }

            pub async fn self_url(&mut self) -> Result<String> {
                Ok(self.load().await?.self_url.clone())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match &self.original {
                    Some(info) => f.write_str(&info.name),
                    None => write!(f, "{}", self.id),
                }
            }
        }
    };
}

dictionary_value!(
    /// Workflow status.
    Status, StatusInfo, status
);
dictionary_value!(
    /// Category grouping statuses (to do, in progress, done).
    StatusCategory, StatusCategoryInfo, status_category
);
dictionary_value!(IssueType, IssueTypeInfo, issue_type);
dictionary_value!(Priority, PriorityInfo, priority);
dictionary_value!(Resolution, ResolutionInfo, resolution);
dictionary_value!(
    /// Issue security level.
    Security, SecurityLevelInfo, security_level
);

impl Status {
    pub async fn description(&mut self) -> Result<Option<String>> {
        Ok(self.load().await?.description.clone())
    }

    pub async fn icon_url(&mut self) -> Result<String> {
        Ok(self.load().await?.icon_url.clone())
    }

    pub async fn category(&mut self) -> Result<Option<StatusCategory>> {
        let client = self.client.clone();
        Ok(self
            .load()
            .await?
            .status_category
            .clone()
            .map(|info| StatusCategory::from_info(&client, info)))
    }
}

impl StatusCategory {
    pub async fn key(&mut self) -> Result<String> {
        Ok(self.load().await?.key.clone())
    }

    pub async fn color_name(&mut self) -> Result<String> {
        Ok(self.load().await?.color_name.clone())
    }
}

impl IssueType {
    pub async fn description(&mut self) -> Result<Option<String>> {
        Ok(self.load().await?.description.clone())
    }

    pub async fn icon_url(&mut self) -> Result<String> {
        Ok(self.load().await?.icon_url.clone())
    }

    pub async fn is_subtask(&mut self) -> Result<bool> {
        Ok(self.load().await?.subtask)
    }
}

impl Priority {
    pub async fn description(&mut self) -> Result<Option<String>> {
        Ok(self.load().await?.description.clone())
    }

    pub async fn icon_url(&mut self) -> Result<String> {
        Ok(self.load().await?.icon_url.clone())
    }

    pub async fn status_color(&mut self) -> Result<Option<String>> {
        Ok(self.load().await?.status_color.clone())
    }
}

impl Resolution {
    pub async fn description(&mut self) -> Result<Option<String>> {
        Ok(self.load().await?.description.clone())
    }
}

impl Security {
    pub async fn description(&mut self) -> Result<Option<String>> {
        Ok(self.load().await?.description.clone())
    }
}
