//! Provider configuration
//!
//! Connection settings come from explicit configuration or the standard
//! NetBox environment variables. `connect` validates credentials up front and
//! yields the `Provider` handle every lifecycle call borrows: the shared
//! client plus the allocation-lock registry, which is scoped to the provider
//! instance rather than living as process-global state.

use crate::codec::status::StatusEncoding;
use crate::error::ProviderError;
use crate::lock::LockRegistry;
use netbox_client::{NetBoxClient, NetBoxClientTrait};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Default per-request timeout, matching the host's operation budget.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Connection settings for one provider instance.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// NetBox API token
    pub api_token: String,
    /// NetBox host, with or without scheme
    pub host: String,
    /// URL path prefix in front of `/api`, usually empty
    pub base_path: String,
    /// Per-request timeout for every remote call
    pub request_timeout: Duration,
    /// Which status representation the target NetBox version expects
    pub status_encoding: StatusEncoding,
}

impl ProviderConfig {
    /// Settings for `host`, with everything else defaulted.
    pub fn new(api_token: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            host: host.into(),
            base_path: String::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            status_encoding: StatusEncoding::default(),
        }
    }

    /// Settings from `NETBOX_TOKEN`/`NETBOX_API_TOKEN`, `NETBOX_HOST` and
    /// `NETBOX_BASE_PATH`.
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_token = std::env::var("NETBOX_TOKEN")
            .or_else(|_| std::env::var("NETBOX_API_TOKEN"))
            .map_err(|_| {
                ProviderError::Validation(
                    "api_token not configured and NETBOX_TOKEN/NETBOX_API_TOKEN unset".to_string(),
                )
            })?;
        let host = std::env::var("NETBOX_HOST").map_err(|_| {
            ProviderError::Validation("host not configured and NETBOX_HOST unset".to_string())
        })?;
        let base_path = std::env::var("NETBOX_BASE_PATH").unwrap_or_default();

        Ok(Self {
            api_token,
            host,
            base_path,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            status_encoding: StatusEncoding::default(),
        })
    }

    /// The fully-qualified base URL the client talks to.
    ///
    /// A bare host gets a scheme inferred: plain http for local development
    /// hosts, https for everything else. Trailing slashes are dropped.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        let with_scheme = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else if host.starts_with("localhost") || host.starts_with("127.0.0.1") {
            format!("http://{}", host)
        } else {
            format!("https://{}", host)
        };

        let base_path = self.base_path.trim_matches('/');
        if base_path.is_empty() {
            with_scheme
        } else {
            format!("{}/{}", with_scheme, base_path)
        }
    }

    /// Build the client, verify the token, and hand back the provider handle.
    pub async fn connect(&self) -> Result<Provider, ProviderError> {
        if self.api_token.is_empty() {
            return Err(ProviderError::Validation("api_token must not be empty".to_string()));
        }

        let base_url = self.base_url();
        info!("Connecting to NetBox at {}", base_url);

        let client = NetBoxClient::new(base_url, self.api_token.clone(), self.request_timeout)?;
        client.validate_token().await?;

        Ok(Provider::with_client(Arc::new(client), self.status_encoding))
    }
}

/// Shared state handed to every lifecycle call.
#[derive(Clone)]
pub struct Provider {
    client: Arc<dyn NetBoxClientTrait>,
    locks: Arc<LockRegistry>,
    status_encoding: StatusEncoding,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("base_url", &self.client.base_url())
            .field("status_encoding", &self.status_encoding)
            .finish()
    }
}

impl Provider {
    /// Provider around an already-built client (tests inject the mock here).
    pub fn with_client(client: Arc<dyn NetBoxClientTrait>, status_encoding: StatusEncoding) -> Self {
        Self {
            client,
            locks: Arc::new(LockRegistry::new()),
            status_encoding,
        }
    }

    /// The remote client.
    pub fn client(&self) -> &dyn NetBoxClientTrait {
        self.client.as_ref()
    }

    /// The allocation-lock registry.
    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    /// The configured status wire representation.
    pub fn status_encoding(&self) -> StatusEncoding {
        self.status_encoding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_is_inferred_from_host() {
        let local = ProviderConfig::new("t", "localhost:8001");
        assert_eq!(local.base_url(), "http://localhost:8001");

        let loopback = ProviderConfig::new("t", "127.0.0.1:8001/");
        assert_eq!(loopback.base_url(), "http://127.0.0.1:8001");

        let remote = ProviderConfig::new("t", "netbox.example.com");
        assert_eq!(remote.base_url(), "https://netbox.example.com");

        let explicit = ProviderConfig::new("t", "http://netbox.example.com/");
        assert_eq!(explicit.base_url(), "http://netbox.example.com");
    }

    #[test]
    fn base_path_is_joined_once() {
        let mut config = ProviderConfig::new("t", "netbox.example.com");
        config.base_path = "/netbox/".to_string();
        assert_eq!(config.base_url(), "https://netbox.example.com/netbox");
    }
}
