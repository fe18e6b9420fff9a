//! jira-client - a lazy-loading object model over the JIRA REST API.
//!
//! [`Client`] exposes the REST resources as sections (`client.issue()`,
//! `client.project()`, ...). The [`model`] wrappers sit on top: they load
//! their JSON on first use, keep pending edits locally and push them on
//! `save()`.
//!
//! ```no_run
//! use jira_client::{Client, Issue};
//!
//! # async fn run() -> jira_client::Result<()> {
//! let client = Client::new("https://jira.example.com/", "rest/api/latest/")?;
//! client.set_auth("jdoe", "token");
//!
//! let mut issue = Issue::by_key(&client, "PROJ-1", &[], &[]).await?;
//! println!("{}", issue.summary().await?);
//! issue.set_summary("Renamed").add_labels(&["triaged"]);
//! issue.save(None, true).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use api::{ApiError, Client};
pub use error::{Error, Result};
pub use model::custom_fields::{CustomField, CustomFieldKind};
pub use model::{
    Attachments, Comment, Component, File, Group, History, Issue, IssueType, Link, LinkType,
    LinksList, Priority, Resolution, Security, Status, StatusCategory, User, UsersList, Version,
    WatchersList,
};
