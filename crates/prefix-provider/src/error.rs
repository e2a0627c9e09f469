//! Provider-specific error types.
//!
//! This module defines error types for the available-prefix lifecycle that
//! are not covered by the NetBox client's own errors.

use netbox_client::NetBoxError;
use thiserror::Error;

/// Errors that can occur in the available-prefix lifecycle.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Parent prefix, resolved name, or resource absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid attribute value caught before any remote call
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Mutually incompatible attributes (e.g. site's tenant vs requested tenant)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The parent prefix has no free block of the requested length
    #[error("Insufficient space in parent prefix for a /{prefix_length} allocation")]
    InsufficientSpace {
        /// Requested mask length
        prefix_length: i64,
    },

    /// Malformed custom-fields structure
    #[error("Invalid custom_fields shape: {0}")]
    Shape(String),

    /// Stored state could not be parsed (e.g. malformed CIDR or resource ID)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Remote call failed; carries the attempted payload for diagnosability
    #[error("Remote operation failed (payload: {payload}): {source}")]
    Remote {
        /// JSON rendering of the payload the call carried
        payload: String,
        /// Underlying client error
        source: NetBoxError,
    },

    /// NetBox API error outside a payload-carrying operation
    #[error("NetBox error: {0}")]
    NetBox(#[from] NetBoxError),
}
