//! NetBox REST API Client
//!
//! A Rust client library for the slice of the NetBox REST API needed to
//! provision "available prefixes": carving a free sub-prefix of a requested
//! length out of a parent prefix, plus the name lookups (site, role, VLAN,
//! VRF, tenant) a prefix's foreign keys depend on.
//!
//! # Example
//!
//! ```no_run
//! use netbox_client::{NetBoxClient, WritablePrefix};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NetBoxClient::new(
//!     "http://netbox:80".to_string(),
//!     "your-api-token".to_string(),
//!     std::time::Duration::from_secs(600),
//! )?;
//!
//! // Carve a /28 out of parent prefix 100
//! let payload = WritablePrefix {
//!     prefix_length: Some(28),
//!     ..Default::default()
//! };
//! let child = client.create_available_prefix(100, &payload).await?;
//! println!("allocated {}", child.prefix);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Available-prefix allocation**: POST to the parent's
//!   `available-prefixes` endpoint
//! - **Prefix CRUD**: read, filtered list, partial update, delete
//! - **Name lookups**: sites, roles, VLANs, VRFs, tenants by exact name
//! - **Pagination**: support for fetching all pages of large result sets

pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod netbox_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::NetBoxClient;
pub use common::{HttpClient, PaginatedResponse};
pub use error::NetBoxError;
pub use models::*;
pub use netbox_trait::NetBoxClientTrait;
#[cfg(feature = "test-util")]
pub use mock::MockNetBoxClient;
