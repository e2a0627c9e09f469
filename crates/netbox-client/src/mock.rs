//! Mock NetBoxClient for unit testing
//!
//! This module provides a mock implementation of NetBoxClientTrait that can be
//! used in unit tests without requiring a running NetBox instance.
//!
//! Beyond in-memory storage, the mock models the two behaviors the lifecycle
//! tests care about:
//! - each parent prefix carries a finite queue of free child blocks, so
//!   allocation can run dry (reproducing the 204-with-body response a real
//!   NetBox emits when no space is left);
//! - every allocation call records its start/end instants and every update
//!   call records its serialized payload, so tests can assert mutual
//!   exclusion and minimal partial-update payloads.

use crate::error::NetBoxError;
use crate::models::*;
use crate::netbox_trait::NetBoxClientTrait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Mock NetBoxClient for testing
#[derive(Debug, Clone)]
pub struct MockNetBoxClient {
    base_url: String,
    // In-memory storage for resources
    prefixes: Arc<Mutex<HashMap<u64, Prefix>>>,
    // Free child CIDRs still available under each parent prefix
    available: Arc<Mutex<HashMap<u64, VecDeque<String>>>>,
    sites: Arc<Mutex<HashMap<u64, Site>>>,
    roles: Arc<Mutex<HashMap<u64, Role>>>,
    vlans: Arc<Mutex<HashMap<u64, Vlan>>>,
    vrfs: Arc<Mutex<HashMap<u64, Vrf>>>,
    tenants: Arc<Mutex<HashMap<u64, Tenant>>>,
    // Call recording for concurrency and payload assertions
    allocation_log: Arc<Mutex<Vec<(Instant, Instant)>>>,
    update_log: Arc<Mutex<Vec<(u64, serde_json::Value)>>>,
    alloc_delay: Arc<Mutex<Duration>>,
    // Counter for generating IDs
    next_id: Arc<Mutex<u64>>,
}

impl MockNetBoxClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            prefixes: Arc::new(Mutex::new(HashMap::new())),
            available: Arc::new(Mutex::new(HashMap::new())),
            sites: Arc::new(Mutex::new(HashMap::new())),
            roles: Arc::new(Mutex::new(HashMap::new())),
            vlans: Arc::new(Mutex::new(HashMap::new())),
            vrfs: Arc::new(Mutex::new(HashMap::new())),
            tenants: Arc::new(Mutex::new(HashMap::new())),
            allocation_log: Arc::new(Mutex::new(Vec::new())),
            update_log: Arc::new(Mutex::new(Vec::new())),
            alloc_delay: Arc::new(Mutex::new(Duration::ZERO)),
            next_id: Arc::new(Mutex::new(1000)),
        }
    }

    /// Build a bare prefix record with the given id and CIDR (for test setup)
    pub fn make_prefix(&self, id: u64, cidr: &str) -> Prefix {
        Prefix {
            id,
            url: format!("{}/api/ipam/prefixes/{}/", self.base_url, id),
            display: cidr.to_string(),
            family: Family::Value(if cidr.contains(':') { 6 } else { 4 }),
            prefix: cidr.to_string(),
            site: None,
            vrf: None,
            tenant: None,
            vlan: None,
            role: None,
            status: serde_json::Value::String("active".to_string()),
            is_pool: false,
            description: String::new(),
            tags: Vec::new(),
            custom_fields: serde_json::json!({}),
            created: chrono::Utc::now().to_rfc3339(),
            last_updated: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Add a prefix to the mock store (for test setup)
    pub fn add_prefix(&self, prefix: Prefix) {
        self.prefixes.lock().unwrap().insert(prefix.id, prefix);
    }

    /// Register a parent prefix together with the free child blocks NetBox
    /// would hand out from it, in order (for test setup)
    pub fn add_parent_prefix(&self, id: u64, cidr: &str, free_children: &[&str]) {
        self.add_prefix(self.make_prefix(id, cidr));
        self.available.lock().unwrap().insert(
            id,
            free_children.iter().map(|s| (*s).to_string()).collect(),
        );
    }

    /// Add a site to the mock store (for test setup)
    pub fn add_site(&self, site: Site) {
        self.sites.lock().unwrap().insert(site.id, site);
    }

    /// Add an IPAM role to the mock store (for test setup)
    pub fn add_role(&self, role: Role) {
        self.roles.lock().unwrap().insert(role.id, role);
    }

    /// Add a VLAN to the mock store (for test setup)
    pub fn add_vlan(&self, vlan: Vlan) {
        self.vlans.lock().unwrap().insert(vlan.id, vlan);
    }

    /// Add a VRF to the mock store (for test setup)
    pub fn add_vrf(&self, vrf: Vrf) {
        self.vrfs.lock().unwrap().insert(vrf.id, vrf);
    }

    /// Add a tenant to the mock store (for test setup)
    pub fn add_tenant(&self, tenant: Tenant) {
        self.tenants.lock().unwrap().insert(tenant.id, tenant);
    }

    /// Make every allocation call take at least `delay` (for overlap tests)
    pub fn set_alloc_delay(&self, delay: Duration) {
        *self.alloc_delay.lock().unwrap() = delay;
    }

    /// Start/end instants of every allocation call, in completion order
    pub fn allocation_intervals(&self) -> Vec<(Instant, Instant)> {
        self.allocation_log.lock().unwrap().clone()
    }

    /// Serialized payload of every partial-update call, in order
    pub fn update_payloads(&self) -> Vec<(u64, serde_json::Value)> {
        self.update_log.lock().unwrap().clone()
    }

    /// Generate next ID
    fn take_next_id(&self) -> u64 {
        let mut id = self.next_id.lock().unwrap();
        let current = *id;
        *id += 1;
        current
    }

    fn nested_site(&self, id: u64) -> Option<NestedSite> {
        self.sites.lock().unwrap().get(&id).map(|s| NestedSite {
            id: s.id,
            url: s.url.clone(),
            name: s.name.clone(),
            slug: s.slug.clone(),
        })
    }

    fn nested_role(&self, id: u64) -> Option<NestedRole> {
        self.roles.lock().unwrap().get(&id).map(|r| NestedRole {
            id: r.id,
            url: r.url.clone(),
            name: r.name.clone(),
            slug: r.slug.clone(),
        })
    }

    fn nested_vlan(&self, id: u64) -> Option<NestedVlan> {
        self.vlans.lock().unwrap().get(&id).map(|v| NestedVlan {
            id: v.id,
            url: v.url.clone(),
            name: v.name.clone(),
            vid: v.vid,
        })
    }

    fn nested_vrf(&self, id: u64) -> Option<NestedVrf> {
        self.vrfs.lock().unwrap().get(&id).map(|v| NestedVrf {
            id: v.id,
            url: v.url.clone(),
            name: v.name.clone(),
        })
    }

    fn nested_tenant(&self, id: u64) -> Option<NestedTenant> {
        self.tenants.lock().unwrap().get(&id).map(|t| NestedTenant {
            id: t.id,
            url: t.url.clone(),
            name: t.name.clone(),
            slug: t.slug.clone(),
        })
    }

    /// Apply a write payload to a stored prefix record
    fn apply_payload(&self, record: &mut Prefix, payload: &WritablePrefix) {
        if let Some(prefix) = &payload.prefix {
            record.prefix = prefix.clone();
        }
        if let Some(status) = &payload.status {
            record.status = status.clone();
        }
        if let Some(is_pool) = payload.is_pool {
            record.is_pool = is_pool;
        }
        if let Some(description) = &payload.description {
            record.description = description.clone();
        }
        if let Some(tags) = &payload.tags {
            record.tags = tags.iter().map(|t| TagValue::Name(t.clone())).collect();
        }
        if let Some(custom_fields) = &payload.custom_fields {
            record.custom_fields = serde_json::Value::Object(custom_fields.clone());
        }
        if let Some(site) = payload.site {
            record.site = self.nested_site(site);
        }
        if let Some(vrf) = payload.vrf {
            record.vrf = self.nested_vrf(vrf);
        }
        if let Some(tenant) = payload.tenant {
            record.tenant = self.nested_tenant(tenant);
        }
        if let Some(vlan) = payload.vlan {
            record.vlan = self.nested_vlan(vlan);
        }
        if let Some(role) = payload.role {
            record.role = self.nested_role(role);
        }
        record.last_updated = chrono::Utc::now().to_rfc3339();
    }
}

fn parse_net(cidr: &str) -> Option<ipnet::IpNet> {
    cidr.parse().ok()
}

fn mask_length(cidr: &str) -> Option<u8> {
    parse_net(cidr).map(|n| n.prefix_len())
}

/// Apply NetBox list-endpoint filter semantics to a stored prefix
fn prefix_matches(record: &Prefix, filters: &[(&str, &str)]) -> bool {
    for (key, value) in filters {
        match *key {
            "prefix" => {
                if record.prefix != *value {
                    return false;
                }
            }
            "within_include" => {
                let (Some(outer), Some(inner)) = (parse_net(value), parse_net(&record.prefix))
                else {
                    return false;
                };
                if !outer.contains(&inner) {
                    return false;
                }
            }
            "contains" => {
                let (Some(inner), Some(outer)) = (parse_net(value), parse_net(&record.prefix))
                else {
                    return false;
                };
                if !outer.contains(&inner) {
                    return false;
                }
            }
            "mask_length" => {
                if mask_length(&record.prefix).map(|l| l.to_string()).as_deref() != Some(*value) {
                    return false;
                }
            }
            "vrf_id" => {
                // Empty string means "no VRF", matching the API convention
                let record_vrf = record.vrf.as_ref().map(|v| v.id.to_string());
                if value.is_empty() {
                    if record_vrf.is_some() {
                        return false;
                    }
                } else if record_vrf.as_deref() != Some(*value) {
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}

#[async_trait::async_trait]
impl NetBoxClientTrait for MockNetBoxClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn validate_token(&self) -> Result<(), NetBoxError> {
        Ok(())
    }

    async fn get_prefix(&self, id: u64) -> Result<Prefix, NetBoxError> {
        self.prefixes
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| NetBoxError::NotFound(format!("Prefix {} not found", id)))
    }

    async fn query_prefixes(&self, filters: &[(&str, &str)], _fetch_all: bool) -> Result<Vec<Prefix>, NetBoxError> {
        let prefixes = self.prefixes.lock().unwrap();
        let mut results: Vec<Prefix> = prefixes
            .values()
            .filter(|p| prefix_matches(p, filters))
            .cloned()
            .collect();
        results.sort_by_key(|p| p.id);
        Ok(results)
    }

    async fn create_available_prefix(&self, parent_id: u64, payload: &WritablePrefix) -> Result<Prefix, NetBoxError> {
        let started = Instant::now();
        let delay = *self.alloc_delay.lock().unwrap();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }

        // Parent must exist
        self.get_prefix(parent_id).await?;

        let requested = payload.prefix_length.ok_or_else(|| {
            NetBoxError::InvalidRequest("prefix_length is required for allocation".to_string())
        })?;

        let next_free = {
            let mut available = self.available.lock().unwrap();
            let queue = available.entry(parent_id).or_default();
            let position = queue
                .iter()
                .position(|c| mask_length(c) == Some(requested as u8));
            position.and_then(|i| queue.remove(i))
        };

        let Some(cidr) = next_free else {
            // Real NetBox answers 204 with a message body here
            self.allocation_log.lock().unwrap().push((started, Instant::now()));
            return Err(NetBoxError::Api(format!(
                "POST /api/ipam/prefixes/{}/available-prefixes/ returned 204 - insufficient space",
                parent_id
            )));
        };

        let id = self.take_next_id();
        let mut record = self.make_prefix(id, &cidr);
        self.apply_payload(&mut record, payload);
        // The allocation endpoint computes the prefix itself; a caller-supplied
        // prefix value never overrides it
        record.prefix = cidr.clone();
        record.display = cidr;

        self.prefixes.lock().unwrap().insert(id, record.clone());
        self.allocation_log.lock().unwrap().push((started, Instant::now()));
        Ok(record)
    }

    async fn update_prefix(&self, id: u64, payload: &WritablePrefix) -> Result<Prefix, NetBoxError> {
        self.update_log
            .lock()
            .unwrap()
            .push((id, serde_json::to_value(payload).unwrap_or_default()));

        let mut prefixes = self.prefixes.lock().unwrap();
        let record = prefixes
            .get_mut(&id)
            .ok_or_else(|| NetBoxError::NotFound(format!("Prefix {} not found", id)))?;
        let mut updated = record.clone();
        drop(prefixes);

        self.apply_payload(&mut updated, payload);
        self.prefixes.lock().unwrap().insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_prefix(&self, id: u64) -> Result<(), NetBoxError> {
        self.prefixes
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| NetBoxError::NotFound(format!("Prefix {} not found", id)))
    }

    async fn query_sites(&self, filters: &[(&str, &str)], _fetch_all: bool) -> Result<Vec<Site>, NetBoxError> {
        let sites = self.sites.lock().unwrap();
        Ok(filter_by_name(sites.values(), filters, |s| &s.name))
    }

    async fn query_roles(&self, filters: &[(&str, &str)], _fetch_all: bool) -> Result<Vec<Role>, NetBoxError> {
        let roles = self.roles.lock().unwrap();
        Ok(filter_by_name(roles.values(), filters, |r| &r.name))
    }

    async fn query_vlans(&self, filters: &[(&str, &str)], _fetch_all: bool) -> Result<Vec<Vlan>, NetBoxError> {
        let vlans = self.vlans.lock().unwrap();
        Ok(filter_by_name(vlans.values(), filters, |v| &v.name))
    }

    async fn query_vrfs(&self, filters: &[(&str, &str)], _fetch_all: bool) -> Result<Vec<Vrf>, NetBoxError> {
        let vrfs = self.vrfs.lock().unwrap();
        Ok(filter_by_name(vrfs.values(), filters, |v| &v.name))
    }

    async fn query_tenants(&self, filters: &[(&str, &str)], _fetch_all: bool) -> Result<Vec<Tenant>, NetBoxError> {
        let tenants = self.tenants.lock().unwrap();
        Ok(filter_by_name(tenants.values(), filters, |t| &t.name))
    }
}

fn filter_by_name<'a, T: Clone + 'a>(
    values: impl Iterator<Item = &'a T>,
    filters: &[(&str, &str)],
    name_of: impl Fn(&T) -> &str,
) -> Vec<T> {
    let wanted = filters
        .iter()
        .find(|(k, _)| *k == "name")
        .map(|(_, v)| *v);
    values
        .filter(|v| wanted.is_none_or(|n| name_of(v) == n))
        .cloned()
        .collect()
}
