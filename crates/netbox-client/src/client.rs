//! NetBox API client
//!
//! Implements the NetBox REST API client for available-prefix provisioning.
//! Based on NetBox API structure: /api/ipam/prefixes/ and the nested
//! /api/ipam/prefixes/{id}/available-prefixes/ allocation endpoint.

use crate::common::{query::query_resources, HttpClient};
use crate::error::NetBoxError;
use crate::models::*;
use crate::netbox_trait::NetBoxClientTrait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// NetBox API client
#[derive(Debug, Clone)]
pub struct NetBoxClient {
    http: HttpClient,
}

impl NetBoxClient {
    /// Create a new NetBox client
    ///
    /// # Arguments
    /// * `base_url` - NetBox base URL (e.g., "http://netbox:80")
    /// * `token` - API token for authentication
    /// * `request_timeout` - per-request timeout applied to every operation
    pub fn new(base_url: String, token: String, request_timeout: Duration) -> Result<Self, NetBoxError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(NetBoxError::Http)?;

        Ok(Self {
            http: HttpClient::new(client, base_url, token),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Validate the API token by making a simple authenticated request.
    ///
    /// Makes a lightweight request to the NetBox status endpoint to test
    /// connectivity and token validity before proceeding with operations.
    pub async fn validate_token(&self) -> Result<(), NetBoxError> {
        let url = self.http.build_url("/api/status/");
        debug!("Validating NetBox token and connectivity");

        let response = self.http.client()
            .get(&url)
            .header("Authorization", self.http.auth_header())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(NetBoxError::Http)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status == 401 || status == 403 {
            return Err(NetBoxError::Authentication(format!(
                "Invalid token: {} - {}",
                status, body
            )));
        }

        if !status.is_success() {
            return Err(NetBoxError::Api(format!(
                "Failed to validate token: {} - {}",
                status, body
            )));
        }

        debug!("Token validated successfully");
        Ok(())
    }

    /// Get a prefix by ID
    pub async fn get_prefix(&self, id: u64) -> Result<Prefix, NetBoxError> {
        debug!("Fetching prefix {} from NetBox", id);
        self.http.get(&format!("/api/ipam/prefixes/{}/", id)).await
    }

    /// Query prefixes by filters
    ///
    /// # Arguments
    /// * `filters` - Query parameters (e.g., [("within_include", "10.0.0.0/16")])
    /// * `fetch_all` - If true, fetch all pages (default: false, returns first page only)
    pub async fn query_prefixes(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Prefix>, NetBoxError> {
        debug!("Querying prefixes with filters: {:?}", filters);
        query_resources(&self.http, "ipam/prefixes", filters, fetch_all).await
    }

    /// Create the next available prefix under a parent prefix
    ///
    /// POSTs to the parent's available-prefixes endpoint; NetBox picks the
    /// first free block of the requested `prefix_length` and returns it.
    ///
    /// # Arguments
    /// * `parent_id` - ID of the parent prefix to allocate from
    /// * `payload` - requested prefix length plus any writable attributes
    pub async fn create_available_prefix(&self, parent_id: u64, payload: &WritablePrefix) -> Result<Prefix, NetBoxError> {
        debug!("Requesting available prefix under parent {}", parent_id);
        let body = serde_json::to_value(payload).map_err(NetBoxError::Serialization)?;
        self.http
            .post(&format!("/api/ipam/prefixes/{}/available-prefixes/", parent_id), &body)
            .await
    }

    /// Partially update an existing prefix
    ///
    /// Only fields set in `payload` are transmitted (PATCH semantics).
    pub async fn update_prefix(&self, id: u64, payload: &WritablePrefix) -> Result<Prefix, NetBoxError> {
        debug!("Updating prefix {} in NetBox", id);
        let body = serde_json::to_value(payload).map_err(NetBoxError::Serialization)?;
        self.http
            .patch(&format!("/api/ipam/prefixes/{}/", id), &body)
            .await
    }

    /// Delete a prefix by ID
    pub async fn delete_prefix(&self, id: u64) -> Result<(), NetBoxError> {
        debug!("Deleting prefix {} from NetBox", id);
        self.http.delete(&format!("/api/ipam/prefixes/{}/", id)).await
    }

    /// Query sites by filters
    pub async fn query_sites(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Site>, NetBoxError> {
        debug!("Querying sites with filters: {:?}", filters);
        query_resources(&self.http, "dcim/sites", filters, fetch_all).await
    }

    /// Query IPAM roles by filters
    pub async fn query_roles(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Role>, NetBoxError> {
        debug!("Querying roles with filters: {:?}", filters);
        query_resources(&self.http, "ipam/roles", filters, fetch_all).await
    }

    /// Query VLANs by filters
    pub async fn query_vlans(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Vlan>, NetBoxError> {
        debug!("Querying VLANs with filters: {:?}", filters);
        query_resources(&self.http, "ipam/vlans", filters, fetch_all).await
    }

    /// Query VRFs by filters
    pub async fn query_vrfs(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Vrf>, NetBoxError> {
        debug!("Querying VRFs with filters: {:?}", filters);
        query_resources(&self.http, "ipam/vrfs", filters, fetch_all).await
    }

    /// Query tenants by filters
    pub async fn query_tenants(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Tenant>, NetBoxError> {
        debug!("Querying tenants with filters: {:?}", filters);
        query_resources(&self.http, "tenancy/tenants", filters, fetch_all).await
    }
}

#[async_trait::async_trait]
impl NetBoxClientTrait for NetBoxClient {
    fn base_url(&self) -> &str {
        self.base_url()
    }

    async fn validate_token(&self) -> Result<(), NetBoxError> {
        self.validate_token().await
    }

    async fn get_prefix(&self, id: u64) -> Result<Prefix, NetBoxError> {
        self.get_prefix(id).await
    }

    async fn query_prefixes(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Prefix>, NetBoxError> {
        self.query_prefixes(filters, fetch_all).await
    }

    async fn create_available_prefix(&self, parent_id: u64, payload: &WritablePrefix) -> Result<Prefix, NetBoxError> {
        self.create_available_prefix(parent_id, payload).await
    }

    async fn update_prefix(&self, id: u64, payload: &WritablePrefix) -> Result<Prefix, NetBoxError> {
        self.update_prefix(id, payload).await
    }

    async fn delete_prefix(&self, id: u64) -> Result<(), NetBoxError> {
        self.delete_prefix(id).await
    }

    async fn query_sites(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Site>, NetBoxError> {
        self.query_sites(filters, fetch_all).await
    }

    async fn query_roles(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Role>, NetBoxError> {
        self.query_roles(filters, fetch_all).await
    }

    async fn query_vlans(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Vlan>, NetBoxError> {
        self.query_vlans(filters, fetch_all).await
    }

    async fn query_vrfs(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Vrf>, NetBoxError> {
        self.query_vrfs(filters, fetch_all).await
    }

    async fn query_tenants(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Tenant>, NetBoxError> {
        self.query_tenants(filters, fetch_all).await
    }
}
