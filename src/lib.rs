//! Declarative resource provider for Pipedream workflows
//!
//! Maps the `pipedream_workflow` resource type onto the Pipedream REST API:
//! create, read, update and delete translate local attributes into JSON
//! requests and map the responses back onto local state.
//!
//! - [`api`] - HTTP transport and the base-URL bound client
//! - [`resource`] - schema registry, dispatch and the workflow lifecycle
//! - [`state`] - host-side resource data and the persisted state file
//! - [`host`] - refresh/plan/apply driver used by the CLI
//! - [`config`] - user configuration

pub mod api;
pub mod config;
pub mod error;
pub mod host;
pub mod resource;
pub mod state;

pub use error::{ProviderError, Result};
