//! Workflow resource
//!
//! Create/read/update/delete of `pipedream_workflow` against the
//! `workflows` collection. Each operation marshals the typed state, sends one
//! request, decodes the response and assigns the result back to the state.
//!
//! Update and delete do not inspect the response status: an update is always
//! followed by a read-back, and a delete always clears the identifier.

use super::registry::{require_resource, ResourceDef};
use super::ReadOutcome;
use crate::api::client::PipedreamClient;
use crate::error::{ProviderError, Result};
use crate::state::ResourceData;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resource type name in the registry
pub const RESOURCE_TYPE: &str = "pipedream_workflow";

/// Typed local state of one workflow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowState {
    /// Remote identifier; empty until created
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Request body for create and update
#[derive(Debug, Serialize)]
struct WorkflowRequest<'a> {
    name: &'a str,
    description: &'a str,
}

/// Remote record as returned by GET /workflows/{id}
#[derive(Debug, Deserialize)]
struct WorkflowRecord {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

impl WorkflowState {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            id: String::new(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    /// Typed state from host-side data, enforcing the schema
    pub fn from_data(data: &ResourceData, def: &ResourceDef) -> Result<Self> {
        def.validate(data.attributes())?;
        let attributes = def.with_defaults(data.attributes());

        let string_attr = |name: &str| {
            attributes
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Ok(Self {
            id: data.id().to_string(),
            name: string_attr("name"),
            description: string_attr("description"),
        })
    }

    /// State carrying only an identifier (enough for read and delete)
    pub fn identified(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    pub fn is_present(&self) -> bool {
        !self.id.is_empty()
    }

    fn request_body(&self) -> Result<Value> {
        serde_json::to_value(WorkflowRequest {
            name: &self.name,
            description: &self.description,
        })
        .map_err(ProviderError::Serialization)
    }
}

fn definition() -> Result<&'static ResourceDef> {
    require_resource(RESOURCE_TYPE)
}

/// Create the workflow remotely, then read it back
pub async fn create(client: &PipedreamClient, state: &mut WorkflowState) -> Result<ReadOutcome> {
    let def = definition()?;
    let url = client.collection_url(&def.endpoint);
    let body = state.request_body()?;

    let response = client.post(&url, &body).await?;
    let json = response.json()?;

    let id = json
        .get(&def.id_field)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            ProviderError::malformed(
                &url,
                format!(
                    "missing or malformed '{}' (status {})",
                    def.id_field, response.status
                ),
            )
        })?;

    state.id = id.to_string();
    tracing::info!("Created workflow '{}' with id {}", state.name, state.id);

    read(client, state).await
}

/// Refresh the state from the remote record
///
/// A 404 clears the identifier and leaves the attributes untouched.
pub async fn read(client: &PipedreamClient, state: &mut WorkflowState) -> Result<ReadOutcome> {
    if !state.is_present() {
        tracing::debug!("Read skipped: workflow has no identifier");
        return Ok(ReadOutcome::Skipped);
    }

    let def = definition()?;
    let url = client.item_url(&def.endpoint, &state.id)?;
    let response = client.get(&url).await?;

    if response.is_not_found() {
        tracing::info!("Workflow {} not found remotely, marking absent", state.id);
        state.id.clear();
        return Ok(ReadOutcome::NotFound);
    }

    let record: WorkflowRecord = serde_json::from_value(response.json()?).map_err(|e| {
        ProviderError::malformed(
            &url,
            format!("unexpected workflow record (status {}): {}", response.status, e),
        )
    })?;

    state.name = record.name;
    state.description = record.description.unwrap_or_default();
    tracing::debug!("Read workflow {} ('{}')", state.id, state.name);

    Ok(ReadOutcome::Found)
}

/// Send the current attributes, then read the workflow back
pub async fn update(client: &PipedreamClient, state: &mut WorkflowState) -> Result<ReadOutcome> {
    if !state.is_present() {
        return Err(ProviderError::MissingIdentifier { operation: "update" });
    }

    let def = definition()?;
    let url = client.item_url(&def.endpoint, &state.id)?;
    let body = state.request_body()?;

    let response = client.put(&url, &body).await?;
    if !response.status.is_success() {
        tracing::warn!(
            "Update of workflow {} returned {}, refreshing anyway",
            state.id,
            response.status
        );
    } else {
        tracing::info!("Updated workflow {}", state.id);
    }

    read(client, state).await
}

/// Delete the workflow remotely and clear the identifier
///
/// Any response status counts as deleted; only transport failures leave the
/// identifier in place.
pub async fn delete(client: &PipedreamClient, state: &mut WorkflowState) -> Result<()> {
    if !state.is_present() {
        tracing::debug!("Delete skipped: workflow has no identifier");
        return Ok(());
    }

    let def = definition()?;
    let url = client.item_url(&def.endpoint, &state.id)?;
    let response = client.delete(&url).await?;

    if !response.status.is_success() {
        tracing::warn!(
            "Delete of workflow {} returned {}, clearing identifier anyway",
            state.id,
            response.status
        );
    } else {
        tracing::info!("Deleted workflow {}", state.id);
    }

    state.id.clear();
    Ok(())
}
