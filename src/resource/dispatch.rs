//! Resource Dispatch
//!
//! Maps a resource type name and lifecycle operation onto the typed
//! implementation, converting between the host-side [`ResourceData`] and the
//! resource's own state struct.

use super::workflow::{self, WorkflowState};
use super::ReadOutcome;
use crate::api::client::PipedreamClient;
use crate::error::{ProviderError, Result};
use crate::state::ResourceData;
use std::fmt;
use std::str::FromStr;

/// Lifecycle operation invoked by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(Operation::Create),
            "read" => Ok(Operation::Read),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            other => Err(ProviderError::UnknownOperation(other.to_string())),
        }
    }
}

/// Run one lifecycle operation on a resource instance
pub async fn execute_operation(
    resource_type: &str,
    operation: Operation,
    client: &PipedreamClient,
    data: &mut ResourceData,
) -> Result<()> {
    tracing::debug!(
        "execute_operation: type={}, operation={}, id={}",
        resource_type,
        operation,
        data.id()
    );

    match resource_type {
        workflow::RESOURCE_TYPE => execute_workflow(operation, client, data).await,
        other => Err(ProviderError::UnknownResourceType(other.to_string())),
    }
}

async fn execute_workflow(
    operation: Operation,
    client: &PipedreamClient,
    data: &mut ResourceData,
) -> Result<()> {
    let mut state = match operation {
        Operation::Create | Operation::Update => {
            let def = super::require_resource(workflow::RESOURCE_TYPE)?;
            WorkflowState::from_data(data, def)?
        }
        Operation::Read | Operation::Delete => WorkflowState::identified(data.id()),
    };

    let outcome = match operation {
        Operation::Create => workflow::create(client, &mut state).await,
        Operation::Read => workflow::read(client, &mut state).await,
        Operation::Update => workflow::update(client, &mut state).await,
        Operation::Delete => workflow::delete(client, &mut state)
            .await
            .map(|()| ReadOutcome::Skipped),
    };

    // Create may have assigned an identifier before its read-back failed
    data.set_id(state.id.clone());

    if let ReadOutcome::Found = outcome? {
        data.set("name", state.name);
        data.set("description", state.description);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names_round_trip() {
        for op in [
            Operation::Create,
            Operation::Read,
            Operation::Update,
            Operation::Delete,
        ] {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn test_unknown_operation() {
        let err = "import".parse::<Operation>().unwrap_err();
        assert!(matches!(err, ProviderError::UnknownOperation(op) if op == "import"));
    }

    #[tokio::test]
    async fn test_unknown_resource_type_makes_no_request() {
        let client = PipedreamClient::new("http://127.0.0.1:9").unwrap();
        let mut data = ResourceData::new();
        let err = execute_operation("pipedream_source", Operation::Read, &client, &mut data)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResourceType(_)));
    }

    #[tokio::test]
    async fn test_create_without_name_fails_before_request() {
        let client = PipedreamClient::new("http://127.0.0.1:9").unwrap();
        let mut data = ResourceData::new();
        let err = execute_operation(workflow::RESOURCE_TYPE, Operation::Create, &client, &mut data)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingAttribute(_)));
        assert!(!data.is_present());
    }
}
