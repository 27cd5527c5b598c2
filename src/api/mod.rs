//! Pipedream API interaction module
//!
//! # Module Structure
//!
//! - [`client`] - Client bound to an API base URL, builds resource URLs
//! - [`http`] - HTTP transport returning raw status and body
//!
//! # Example
//!
//! ```ignore
//! use pipedream_provider::api::client::{PipedreamClient, DEFAULT_API_URL};
//!
//! async fn example() -> pipedream_provider::error::Result<()> {
//!     let client = PipedreamClient::new(DEFAULT_API_URL)?;
//!     let response = client.get(&client.item_url("workflows", "p_abc123")?).await?;
//!     println!("{}", response.status);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;
