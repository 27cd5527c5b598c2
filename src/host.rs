//! Reconciliation driver
//!
//! A minimal host for the provider: loads the desired configuration,
//! refreshes known resources with a single read-back each, plans one action
//! per resource and executes the plan one resource at a time. State is saved
//! after every executed step and the first failure aborts the run.

use crate::api::client::PipedreamClient;
use crate::resource::{execute_operation, require_resource, Operation};
use crate::state::{ResourceData, ResourceInstance, StateFile};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Desired configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DesiredConfig {
    #[serde(default)]
    pub resources: BTreeMap<String, DesiredResource>,
}

/// One desired resource instance
#[derive(Debug, Clone, Deserialize)]
pub struct DesiredResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl DesiredConfig {
    /// Load and validate a YAML desired configuration
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid configuration {}", path.display()))
    }

    /// Parse YAML and check every resource against its schema
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: DesiredConfig = serde_yaml::from_str(content)?;

        for (name, resource) in &config.resources {
            let def = require_resource(&resource.resource_type)
                .with_context(|| format!("resource '{}'", name))?;
            def.validate(&resource.attributes)
                .with_context(|| format!("resource '{}'", name))?;
        }

        Ok(config)
    }
}

/// Action planned for one resource instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
    NoOp,
}

impl Action {
    fn operation(self) -> Option<Operation> {
        match self {
            Action::Create => Some(Operation::Create),
            Action::Update => Some(Operation::Update),
            Action::Delete => Some(Operation::Delete),
            Action::NoOp => None,
        }
    }
}

/// One entry of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChange {
    pub name: String,
    pub resource_type: String,
    pub action: Action,
}

impl fmt::Display for PlannedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (symbol, verb) = match self.action {
            Action::Create => ("+", "create"),
            Action::Update => ("~", "update"),
            Action::Delete => ("-", "delete"),
            Action::NoOp => (" ", "no changes"),
        };
        write!(f, "{} {} ({}): {}", symbol, self.name, self.resource_type, verb)
    }
}

/// Counts of executed actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl fmt::Display for ApplySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} deleted",
            self.created, self.updated, self.deleted
        )
    }
}

/// Decide the action for one resource from its desired and current state
pub fn plan_change(
    name: &str,
    desired: Option<&DesiredResource>,
    current: Option<&ResourceInstance>,
) -> Result<Action> {
    let present = current.filter(|c| c.data.is_present());

    match (desired, present) {
        (Some(desired), Some(current)) => {
            if desired.resource_type != current.resource_type {
                anyhow::bail!(
                    "resource '{}' changed type from {} to {}; destroy it before changing its type",
                    name,
                    current.resource_type,
                    desired.resource_type
                );
            }
            let def = require_resource(&desired.resource_type)?;
            if def.with_defaults(&desired.attributes) == def.with_defaults(current.data.attributes()) {
                Ok(Action::NoOp)
            } else {
                Ok(Action::Update)
            }
        }
        (Some(_), None) => Ok(Action::Create),
        (None, Some(_)) => Ok(Action::Delete),
        (None, None) => Ok(Action::NoOp),
    }
}

/// Drives lifecycle operations for every resource in a state file
pub struct Reconciler<'a> {
    client: &'a PipedreamClient,
    state: StateFile,
    state_path: PathBuf,
}

impl<'a> Reconciler<'a> {
    /// Open the state file at `state_path`
    pub fn open(client: &'a PipedreamClient, state_path: &Path) -> Result<Self> {
        let state = StateFile::load(state_path)?;
        Ok(Self {
            client,
            state,
            state_path: state_path.to_path_buf(),
        })
    }

    pub fn state(&self) -> &StateFile {
        &self.state
    }

    fn save(&mut self) -> Result<()> {
        self.state.save(&self.state_path)
    }

    /// Read back every resource that has an identifier
    pub async fn refresh(&mut self) -> Result<()> {
        let names: Vec<String> = self
            .state
            .resources
            .iter()
            .filter(|(_, instance)| instance.data.is_present())
            .map(|(name, _)| name.clone())
            .collect();

        for name in names {
            let Some(instance) = self.state.resources.get_mut(&name) else {
                continue;
            };
            tracing::info!("Refreshing {} ({})", name, instance.data.id());

            let result = execute_operation(
                &instance.resource_type,
                Operation::Read,
                self.client,
                &mut instance.data,
            )
            .await;

            if result.is_ok() && !instance.data.is_present() {
                tracing::warn!("{} no longer exists remotely", name);
            }

            self.save()?;
            result.with_context(|| format!("Failed to refresh '{}'", name))?;
        }

        Ok(())
    }

    /// Plan actions for every resource in the desired config or the state
    pub fn plan(&self, desired: &DesiredConfig) -> Result<Vec<PlannedChange>> {
        let names: BTreeSet<&String> = desired
            .resources
            .keys()
            .chain(self.state.resources.keys())
            .collect();

        names
            .into_iter()
            .map(|name| -> Result<PlannedChange> {
                let wanted = desired.resources.get(name);
                let current = self.state.resources.get(name);
                let action = plan_change(name, wanted, current)?;
                let resource_type = wanted
                    .map(|d| d.resource_type.clone())
                    .or_else(|| current.map(|c| c.resource_type.clone()))
                    .unwrap_or_default();

                Ok(PlannedChange {
                    name: name.clone(),
                    resource_type,
                    action,
                })
            })
            .collect()
    }

    /// Plan that deletes every resource in the state
    pub fn plan_destroy(&self) -> Result<Vec<PlannedChange>> {
        self.plan(&DesiredConfig::default())
    }

    /// Execute a plan in order
    pub async fn apply(
        &mut self,
        desired: &DesiredConfig,
        changes: &[PlannedChange],
    ) -> Result<ApplySummary> {
        let mut summary = ApplySummary::default();

        for change in changes {
            let Some(operation) = change.action.operation() else {
                continue;
            };
            tracing::info!("{}", change);

            let instance = self
                .state
                .resources
                .entry(change.name.clone())
                .or_insert_with(|| ResourceInstance {
                    resource_type: change.resource_type.clone(),
                    data: ResourceData::new(),
                });

            match change.action {
                Action::Create | Action::Update => {
                    let wanted = desired.resources.get(&change.name).with_context(|| {
                        format!(
                            "'{}' is planned for {:?} but not configured",
                            change.name, change.action
                        )
                    })?;
                    instance.resource_type = wanted.resource_type.clone();
                    instance.data.replace_attributes(wanted.attributes.clone());
                }
                Action::Delete | Action::NoOp => {}
            }

            let result = execute_operation(
                &instance.resource_type,
                operation,
                self.client,
                &mut instance.data,
            )
            .await;

            if result.is_ok() {
                match change.action {
                    Action::Create => summary.created += 1,
                    Action::Update => summary.updated += 1,
                    Action::Delete => summary.deleted += 1,
                    Action::NoOp => {}
                }
            }

            self.prune(desired);
            self.save()?;
            result.with_context(|| format!("Failed to {} '{}'", operation, change.name))?;
        }

        self.prune(desired);
        self.save()?;
        Ok(summary)
    }

    /// Drop instances that are absent remotely and no longer configured
    fn prune(&mut self, desired: &DesiredConfig) {
        self.state.resources.retain(|name, instance| {
            instance.data.is_present() || desired.resources.contains_key(name)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn desired(name: &str, description: Option<&str>) -> DesiredResource {
        let mut attributes = BTreeMap::new();
        attributes.insert("name".to_string(), json!(name));
        if let Some(d) = description {
            attributes.insert("description".to_string(), json!(d));
        }
        DesiredResource {
            resource_type: "pipedream_workflow".to_string(),
            attributes,
        }
    }

    fn current(id: &str, name: &str, description: &str) -> ResourceInstance {
        let mut data = ResourceData::new();
        data.set_id(id);
        data.set("name", name);
        data.set("description", description);
        ResourceInstance {
            resource_type: "pipedream_workflow".to_string(),
            data,
        }
    }

    #[test]
    fn test_plan_create_when_absent() {
        let d = desired("wf1", None);
        assert_eq!(plan_change("main", Some(&d), None).unwrap(), Action::Create);

        let cleared = current("", "wf1", "");
        assert_eq!(
            plan_change("main", Some(&d), Some(&cleared)).unwrap(),
            Action::Create
        );
    }

    #[test]
    fn test_plan_noop_when_equal_after_defaults() {
        let d = desired("wf1", None);
        let c = current("abc123", "wf1", "");
        assert_eq!(plan_change("main", Some(&d), Some(&c)).unwrap(), Action::NoOp);
    }

    #[test]
    fn test_plan_update_when_different() {
        let d = desired("wf1-renamed", Some("first"));
        let c = current("abc123", "wf1", "first");
        assert_eq!(plan_change("main", Some(&d), Some(&c)).unwrap(), Action::Update);
    }

    #[test]
    fn test_plan_delete_when_removed() {
        let c = current("abc123", "wf1", "first");
        assert_eq!(plan_change("main", None, Some(&c)).unwrap(), Action::Delete);
        assert_eq!(plan_change("main", None, None).unwrap(), Action::NoOp);
    }

    #[test]
    fn test_plan_rejects_type_change() {
        let mut d = desired("wf1", None);
        d.resource_type = "pipedream_source".to_string();
        let c = current("abc123", "wf1", "");
        assert!(plan_change("main", Some(&d), Some(&c)).is_err());
    }

    #[test]
    fn test_desired_config_from_yaml() {
        let config = DesiredConfig::from_yaml(
            r#"
resources:
  main:
    type: pipedream_workflow
    attributes:
      name: wf1
      description: first
"#,
        )
        .unwrap();
        let main = &config.resources["main"];
        assert_eq!(main.resource_type, "pipedream_workflow");
        assert_eq!(main.attributes["name"], json!("wf1"));
    }

    #[test]
    fn test_desired_config_validates_schema() {
        let missing_name = DesiredConfig::from_yaml(
            "resources:\n  main:\n    type: pipedream_workflow\n    attributes:\n      description: x\n",
        );
        assert!(missing_name.is_err());

        let unknown_type =
            DesiredConfig::from_yaml("resources:\n  main:\n    type: pipedream_source\n");
        assert!(unknown_type.is_err());
    }

    #[test]
    fn test_planned_change_display() {
        let change = PlannedChange {
            name: "main".to_string(),
            resource_type: "pipedream_workflow".to_string(),
            action: Action::Create,
        };
        assert_eq!(change.to_string(), "+ main (pipedream_workflow): create");
    }
}
