//! Section handles of the [`Client`](super::Client).
//!
//! Each section groups the REST operations of one resource type and returns
//! the decoded JSON answers.

mod attachment;
mod component;
mod dictionary;
mod field;
mod group;
mod issue;
mod issue_link;
mod issue_link_type;
mod jql;
mod project;
mod user;
mod version;

pub use attachment::AttachmentSection;
pub use component::ComponentSection;
pub use dictionary::{DictionarySection, SecurityLevelSection};
pub use field::FieldSection;
pub use group::GroupSection;
pub use issue::{
    CommentSection, IssueAttachmentsSection, IssueSection, TransitionsSection, WatchersSection,
};
pub use issue_link::IssueLinkSection;
pub use issue_link_type::IssueLinkTypeSection;
pub use jql::JqlSection;
pub use project::{compare_versions, ProjectSection};
pub use user::UserSection;
pub use version::VersionSection;

use serde_json::{Map, Value};

/// Comma separated list for `expand`/`fields` query arguments.
pub(crate) fn join_list(items: &[&str]) -> Option<String> {
    (!items.is_empty()).then(|| items.join(","))
}

/// Elements of an array answer; anything else yields nothing.
pub(crate) fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

/// Elements of the array stored under `key`.
pub(crate) fn take_list(value: Value, key: &str) -> Vec<Value> {
    match value {
        Value::Object(mut map) => map.remove(key).map(into_list).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Merge the entries of `extra` (when it is an object) into `target`.
pub(crate) fn merge_into(target: &mut Map<String, Value>, extra: Option<Map<String, Value>>) {
    if let Some(extra) = extra {
        target.extend(extra);
    }
}
