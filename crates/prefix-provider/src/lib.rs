//! NetBox available-prefix provisioning
//!
//! Manages "carve a free sub-prefix out of a parent prefix" as a declarative
//! resource: allocation through NetBox's available-prefixes endpoint,
//! state refresh, field-wise partial update, deletion, and import, plus a
//! read-only prefix-search datasource.
//!
//! The lifecycle layer is generic over [`netbox_client::NetBoxClientTrait`],
//! so tests run against the in-memory mock while production uses the HTTP
//! client. Allocation against one parent prefix is serialized through a
//! per-provider [`lock::LockRegistry`].
//!
//! # Example
//!
//! ```no_run
//! use prefix_provider::{AvailablePrefixResource, ProviderConfig, ResourceData};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = ProviderConfig::new("api-token", "netbox.example.com")
//!     .connect()
//!     .await?;
//!
//! let resource = AvailablePrefixResource::new(provider);
//! let mut data = ResourceData::new();
//! data.set("parent_prefix_id", 100)?;
//! data.set("prefix_length", 28)?;
//! resource.create(&mut data).await?;
//! println!("allocated {}", data.get_string("prefix"));
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod data;
pub mod datasource;
pub mod error;
pub mod lock;
pub mod resolver;
pub mod resource;

pub use codec::status::{PrefixStatus, StatusEncoding};
pub use config::{Provider, ProviderConfig};
pub use data::ResourceData;
pub use datasource::PrefixSearch;
pub use error::ProviderError;
pub use lock::LockRegistry;
pub use resource::available_prefix::AvailablePrefixResource;
