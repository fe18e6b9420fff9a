//! `group` resource and group membership.

use serde_json::{json, Value};
use tracing::debug;

use super::{join_list, take_list};
use crate::api::{Client, Result};

/// Page size used to walk group members.
const MEMBERS_PAGE_SIZE: u32 = 50;

/// Operations on user groups.
#[derive(Debug, Clone, Copy)]
pub struct GroupSection<'a> {
    client: &'a Client,
}

impl<'a> GroupSection<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, name: &str, expand: &[&str]) -> Result<Value> {
        self.client
            .raw()
            .get("group", &json!({"groupname": name, "expand": join_list(expand)}))
            .await
    }

    /// All members of a group, walking every page of `group/member`.
    pub async fn list_all_users(&self, name: &str, include_inactive: bool) -> Result<Vec<Value>> {
        let mut users = Vec::new();
        let mut start_at = 0;

        loop {
            let page = self
                .client
                .raw()
                .get(
                    "group/member",
                    &json!({
                        "groupname": name,
                        "startAt": start_at,
                        "maxResults": MEMBERS_PAGE_SIZE,
                        "includeInactiveUsers": include_inactive,
                    }),
                )
                .await?;

            let is_last = page.get("isLast").and_then(Value::as_bool).unwrap_or(true);
            let values = take_list(page, "values");
            let received = values.len();
            users.extend(values);

            if is_last || received == 0 {
                break;
            }
            start_at += received;
        }

        debug!(group = name, count = users.len(), "Loaded group members");
        Ok(users)
    }

    pub async fn create(&self, name: &str) -> Result<Value> {
        self.client.raw().post("group", json!({"name": name})).await
    }

    /// Delete a group, optionally moving its restrictions to `swap_group`.
    pub async fn delete(&self, name: &str, swap_group: Option<&str>) -> Result<()> {
        self.client
            .raw()
            .delete("group", &json!({"groupname": name, "swapGroup": swap_group}))
            .await?;
        Ok(())
    }

    pub async fn add_user(&self, group: &str, login: &str) -> Result<Value> {
        self.client
            .raw()
            .post(
                &format!("group/user?groupname={}", urlencoding::encode(group)),
                json!({"name": login}),
            )
            .await
    }

    pub async fn remove_user(&self, group: &str, login: &str) -> Result<()> {
        self.client
            .raw()
            .delete("group/user", &json!({"groupname": group, "username": login}))
            .await?;
        Ok(())
    }
}
