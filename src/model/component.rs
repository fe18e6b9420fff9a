//! Project components.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Map, Value};
use tracing::debug;

use super::user::User;
use crate::api::types::{decode, ComponentInfo};
use crate::api::Client;
use crate::error::{Error, Result};

/// Who gets new issues of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssigneeType {
    #[default]
    Unassigned,
    ComponentLead,
    ProjectLead,
    ProjectDefault,
}

impl AssigneeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssigneeType::Unassigned => "UNASSIGNED",
            AssigneeType::ComponentLead => "COMPONENT_LEAD",
            AssigneeType::ProjectLead => "PROJECT_LEAD",
            AssigneeType::ProjectDefault => "PROJECT_DEFAULT",
        }
    }
}

impl FromStr for AssigneeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "UNASSIGNED" => Ok(AssigneeType::Unassigned),
            "COMPONENT_LEAD" => Ok(AssigneeType::ComponentLead),
            "PROJECT_LEAD" => Ok(AssigneeType::ProjectLead),
            "PROJECT_DEFAULT" => Ok(AssigneeType::ProjectDefault),
            other => Err(Error::component(format!("Unknown assignee type '{}'", other))),
        }
    }
}

impl fmt::Display for AssigneeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project component.
///
/// A component with id 0 does not exist in JIRA yet; [`Component::save`]
/// creates it from the values set so far.
#[derive(Debug, Clone)]
pub struct Component {
    client: Client,
    id: u64,
    original: Option<ComponentInfo>,
    update: Map<String, Value>,
}

impl Component {
    pub fn new(client: &Client, id: u64) -> Self {
        Self {
            client: client.clone(),
            id,
            original: None,
            update: Map::new(),
        }
    }

    pub fn from_info(client: &Client, info: ComponentInfo) -> Self {
        let mut component = Self::new(client, info.id);
        component.original = Some(info);
        component
    }

    pub async fn get(client: &Client, id: u64) -> Result<Self> {
        let mut component = Self::new(client, id);
        component.load().await?;
        Ok(component)
    }

    /// Components of a project given by key or id.
    pub async fn for_project(client: &Client, project: &str) -> Result<Vec<Self>> {
        client
            .project()
            .list_components(project)
            .await?
            .into_iter()
            .map(|value| Ok(Self::from_info(client, decode(value)?)))
            .collect()
    }

    pub async fn by_name(client: &Client, project: &str, name: &str) -> Result<Option<Self>> {
        Ok(Self::for_project(client, project)
            .await?
            .into_iter()
            .find(|c| c.original.as_ref().is_some_and(|info| info.name == name)))
    }

    pub async fn exists(client: &Client, project: &str, name: &str) -> Result<bool> {
        Ok(Self::by_name(client, project, name).await?.is_some())
    }

    async fn load(&mut self) -> Result<&ComponentInfo> {
        let info = match self.original.take() {
            Some(info) => info,
            None if self.id == 0 => ComponentInfo::default(),
            None => decode(self.client.component().get(self.id).await?)?,
        };
        Ok(self.original.insert(info))
    }

    pub fn drop_cache(&mut self) {
        self.original = None;
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Edits not saved yet.
    pub fn pending_update(&self) -> &Map<String, Value> {
        &self.update
    }

    pub async fn name(&mut self) -> Result<String> {
        Ok(self.load().await?.name.clone())
    }

    pub async fn description(&mut self) -> Result<Option<String>> {
        Ok(self.load().await?.description.clone())
    }

    /// Numeric project id. Some answers omit it; the component is then
    /// fetched again.
    pub async fn project_id(&mut self) -> Result<Option<u64>> {
        if self.id != 0 && self.original.as_ref().is_some_and(|info| info.project_id.is_none()) {
            self.original = None;
        }
        Ok(self.load().await?.project_id)
    }

    pub async fn project_key(&mut self) -> Result<Option<String>> {
        Ok(self.load().await?.project.clone())
    }

    pub async fn lead(&mut self) -> Result<Option<User>> {
        let client = self.client.clone();
        Ok(self
            .load()
            .await?
            .lead
            .clone()
            .map(|info| User::from_info(&client, info)))
    }

    pub async fn assignee_type(&mut self) -> Result<AssigneeType> {
        match self.load().await?.assignee_type.as_deref() {
            Some(kind) => kind.parse(),
            None => Ok(AssigneeType::default()),
        }
    }

    /// User that receives new issues of the component.
    pub async fn default_assignee(&mut self) -> Result<Option<User>> {
        let client = self.client.clone();
        Ok(self
            .load()
            .await?
            .assignee
            .clone()
            .map(|info| User::from_info(&client, info)))
    }

    /// Move the component to a project given by key or numeric id.
    pub fn set_project(&mut self, project: &str) {
        self.update.remove("project");
        self.update.remove("projectId");
        match project.parse::<u64>() {
            Ok(id) => self.update.insert("projectId".into(), json!(id)),
            Err(_) => self.update.insert("project".into(), json!(project)),
        };
    }

    pub fn set_name(&mut self, name: &str) {
        self.update.insert("name".into(), json!(name));
    }

    pub fn set_description(&mut self, description: &str) {
        self.update.insert("description".into(), json!(description));
    }

    pub fn set_assignee_type(&mut self, assignee_type: AssigneeType) {
        self.update
            .insert("assigneeType".into(), json!(assignee_type.as_str()));
    }

    /// Make `login` the component lead. The user must exist.
    pub async fn set_lead(&mut self, login: &str) -> Result<()> {
        let user = match User::get(&self.client, login).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                return Err(Error::component(
                    "Can't change component's lead: user not found in Jira.",
                ))
            }
            Err(e) => return Err(e),
        };
        self.update.insert("leadUserName".into(), json!(user.name()));
        Ok(())
    }

    /// Push pending edits, creating the component when it has no id yet.
    pub async fn save(&mut self) -> Result<()> {
        let answer = if self.id != 0 {
            if self.update.is_empty() {
                return Ok(());
            }
            self.client
                .component()
                .update(self.id, self.update.clone())
                .await?
        } else {
            let mut fields = self.update.clone();
            let project = match (fields.remove("projectId"), fields.remove("project")) {
                (Some(id), _) => Some(id.to_string()),
                (None, Some(Value::String(key))) => Some(key),
                _ => None,
            };
            let name = match fields.remove("name") {
                Some(Value::String(name)) => Some(name),
                _ => None,
            };
            let (Some(project), Some(name)) = (project, name) else {
                return Err(Error::component(
                    "Can't create component without project and name",
                ));
            };
            self.client
                .component()
                .create(&project, &name, Some(fields))
                .await?
        };

        let info: ComponentInfo = decode(answer)?;
        debug!(id = info.id, name = %info.name, "Component saved");
        self.id = info.id;
        self.original = Some(info);
        self.update.clear();
        Ok(())
    }

    /// Delete the component, optionally moving its issues to another one.
    pub async fn delete(self, move_issues_to: Option<u64>) -> Result<()> {
        self.client.component().delete(self.id, move_issues_to).await?;
        Ok(())
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.original {
            Some(info) if !info.name.is_empty() => f.write_str(&info.name),
            _ => write!(f, "{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::{api_path, test_client};
    use crate::api::transport::{Payload, RequestMethod};

    fn component_json() -> Value {
        json!({
            "id": "10000",
            "name": "Backend",
            "project": "TEST",
            "projectId": 10100,
            "assigneeType": "COMPONENT_LEAD",
            "lead": {"name": "jdoe"}
        })
    }

    #[test]
    fn test_assignee_type_strings() {
        assert_eq!(AssigneeType::ProjectDefault.to_string(), "PROJECT_DEFAULT");
        assert_eq!("PROJECT_LEAD".parse::<AssigneeType>().unwrap(), AssigneeType::ProjectLead);
        assert!("SOMEONE".parse::<AssigneeType>().is_err());
    }

    #[tokio::test]
    async fn test_getters() {
        let (client, transport) = test_client();
        transport.push_json(200, component_json());

        let mut component = Component::get(&client, 10000).await.unwrap();
        assert_eq!(component.name().await.unwrap(), "Backend");
        assert_eq!(component.project_key().await.unwrap().as_deref(), Some("TEST"));
        assert_eq!(component.project_id().await.unwrap(), Some(10100));
        assert_eq!(component.assignee_type().await.unwrap(), AssigneeType::ComponentLead);
        assert_eq!(component.lead().await.unwrap().unwrap().name(), "jdoe");
        assert!(component.default_assignee().await.unwrap().is_none());
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_project_id_reloads_when_missing() {
        let (client, transport) = test_client();
        transport.push_json(200, component_json());

        let mut component =
            Component::from_info(&client, decode(json!({"id": 10000, "name": "Backend"})).unwrap());
        assert_eq!(component.project_id().await.unwrap(), Some(10100));
        assert_eq!(api_path(&transport.sent()[0].url), "component/10000");
    }

    #[tokio::test]
    async fn test_by_name() {
        let (client, transport) = test_client();
        transport.push_json(200, json!([{"id": "1", "name": "UI"}, component_json()]));
        transport.push_json(200, json!([{"id": "1", "name": "UI"}]));

        let found = Component::by_name(&client, "TEST", "Backend").await.unwrap();
        assert_eq!(found.unwrap().id(), 10000);
        assert!(!Component::exists(&client, "TEST", "Backend").await.unwrap());
        assert_eq!(api_path(&transport.sent()[0].url), "project/TEST/components");
    }

    #[tokio::test]
    async fn test_save_creates_new_component() {
        let (client, transport) = test_client();
        transport.push_json(201, component_json());

        let mut component = Component::new(&client, 0);
        component.set_project("TEST");
        component.set_name("Backend");
        component.set_assignee_type(AssigneeType::ComponentLead);
        component.save().await.unwrap();

        assert_eq!(component.id(), 10000);
        assert!(component.pending_update().is_empty());
        let sent = transport.sent();
        assert_eq!(sent[0].method, RequestMethod::Post);
        assert_eq!(
            sent[0].payload,
            Payload::Json(json!({"project": "TEST", "name": "Backend", "assigneeType": "COMPONENT_LEAD"}))
        );
    }

    #[tokio::test]
    async fn test_save_without_name_fails() {
        let (client, transport) = test_client();
        let mut component = Component::new(&client, 0);
        component.set_project("10100");

        let err = component.save().await.unwrap_err();
        assert!(matches!(err, Error::Component(_)));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_save_updates_existing_component() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({"id": "10000", "name": "Back office"}));

        let mut component = Component::from_info(&client, decode(component_json()).unwrap());
        component.set_name("Back office");
        component.save().await.unwrap();

        assert_eq!(component.name().await.unwrap(), "Back office");
        let sent = transport.sent();
        assert_eq!(sent[0].method, RequestMethod::Put);
        assert_eq!(api_path(&sent[0].url), "component/10000");
    }

    #[tokio::test]
    async fn test_set_lead_unknown_user() {
        let (client, transport) = test_client();
        transport.push_json(404, json!({"errorMessages": ["The user named 'ghost' does not exist"]}));

        let mut component = Component::new(&client, 10000);
        let err = component.set_lead("ghost").await.unwrap_err();
        assert!(matches!(err, Error::Component(_)));
        assert!(component.pending_update().is_empty());
        assert_eq!(transport.sent().len(), 1);
    }
}
