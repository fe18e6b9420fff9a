//! `project` resource, with its components, statuses and versions.

use std::cmp::Ordering;

use serde_json::{json, Value};

use super::{into_list, join_list};
use crate::api::{Client, Result};

/// Operations on projects.
#[derive(Debug, Clone, Copy)]
pub struct ProjectSection<'a> {
    client: &'a Client,
}

impl<'a> ProjectSection<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Project info by key or numeric id.
    pub async fn get(&self, project: &str, expand: &[&str]) -> Result<Value> {
        self.client
            .raw()
            .get(
                &format!("project/{}", project),
                &json!({"expand": join_list(expand)}),
            )
            .await
    }

    /// Projects visible to the current user.
    pub async fn list(&self) -> Result<Vec<Value>> {
        Ok(into_list(self.client.raw().get("project", &Value::Null).await?))
    }

    pub async fn list_components(&self, project: &str) -> Result<Vec<Value>> {
        self.list_of(project, "components").await
    }

    /// Statuses grouped by issue type.
    pub async fn list_statuses(&self, project: &str) -> Result<Vec<Value>> {
        self.list_of(project, "statuses").await
    }

    pub async fn list_versions(&self, project: &str) -> Result<Vec<Value>> {
        self.list_of(project, "versions").await
    }

    /// The version with the greatest name, compared as version numbers.
    pub async fn latest_version(&self, project: &str) -> Result<Option<Value>> {
        let versions = self.list_versions(project).await?;
        let name = |v: &Value| v.get("name").and_then(Value::as_str).unwrap_or("").to_string();

        // Later entries win ties.
        Ok(versions.into_iter().rev().reduce(|latest, version| {
            if compare_versions(&name(&version), &name(&latest)) == Ordering::Greater {
                version
            } else {
                latest
            }
        }))
    }

    async fn list_of(&self, project: &str, what: &str) -> Result<Vec<Value>> {
        Ok(into_list(
            self.client
                .raw()
                .get(&format!("project/{}/{}", project, what), &Value::Null)
                .await?,
        ))
    }
}

/// Rank of a textual version part: dev < alpha < beta < rc < (number) < pl.
fn special_rank(part: &str) -> i32 {
    match part.to_lowercase().as_str() {
        "dev" => 0,
        "alpha" | "a" => 1,
        "beta" | "b" => 2,
        "rc" => 3,
        "#" => 4,
        "pl" | "p" => 5,
        _ => -1,
    }
}

fn version_parts(version: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = None;

    for c in version.chars() {
        if matches!(c, '.' | '-' | '_' | '+') {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
            current_is_digit = None;
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if current_is_digit.is_some_and(|d| d != is_digit) && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        current.push(c);
        current_is_digit = Some(is_digit);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn compare_parts(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => special_rank("#").cmp(&special_rank(b)),
        (Err(_), Ok(_)) => special_rank(a).cmp(&special_rank("#")),
        (Err(_), Err(_)) => special_rank(a).cmp(&special_rank(b)),
    }
}

/// Compare two version strings such as `1.10.0` and `1.9-rc1`.
///
/// Numeric parts compare as numbers; pre-release words sort before releases.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = version_parts(a);
    let right = version_parts(b);

    for i in 0..left.len().max(right.len()) {
        let ordering = match (left.get(i), right.get(i)) {
            (Some(x), Some(y)) => compare_parts(x, y),
            (Some(x), None) => {
                if x.parse::<u64>().is_ok() {
                    Ordering::Greater
                } else {
                    special_rank(x).cmp(&special_rank("#"))
                }
            }
            (None, Some(y)) => {
                if y.parse::<u64>().is_ok() {
                    Ordering::Less
                } else {
                    special_rank("#").cmp(&special_rank(y))
                }
            }
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
