//! Resource abstraction layer
//!
//! Resource schemas are data: they are declared in embedded JSON and loaded
//! into a registry, while the lifecycle operations live in one module per
//! resource type.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource definitions from embedded JSON
//! - [`dispatch`] - Maps a type name and operation onto the implementation
//! - [`workflow`] - Create/read/update/delete of Pipedream workflows
//!
//! # Example
//!
//! ```ignore
//! use pipedream_provider::resource::{execute_operation, Operation};
//! use pipedream_provider::state::ResourceData;
//!
//! async fn create(client: &PipedreamClient) -> pipedream_provider::error::Result<String> {
//!     let mut data = ResourceData::new();
//!     data.set("name", "nightly-sync");
//!     execute_operation("pipedream_workflow", Operation::Create, client, &mut data).await?;
//!     Ok(data.id().to_string())
//! }
//! ```

pub mod dispatch;
mod registry;
pub mod workflow;

pub use dispatch::{execute_operation, Operation};
pub use registry::*;

/// Result of the read-back that ends create, read and update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Remote record found; attributes were refreshed
    Found,
    /// Remote returned 404; the identifier was cleared
    NotFound,
    /// No identifier, so no request was made
    Skipped,
}
