//! Available-prefix resource lifecycle
//!
//! Carves a free sub-prefix of a requested length out of a parent prefix and
//! manages it as a first-class resource: creation via NetBox's
//! available-prefixes endpoint, side-effect-free refresh, field-wise partial
//! update, deletion, and import from a bare remote ID.
//!
//! Creation against one parent is serialized through the provider's lock
//! registry; the lock covers only the remote allocation call, never the
//! name-resolution steps. Parent identity and prefix length are immutable:
//! the host replaces the resource instead of updating it, and Update rejects
//! such changes outright.

use crate::codec::custom_fields;
use crate::codec::status::PrefixStatus;
use crate::config::Provider;
use crate::data::ResourceData;
use crate::error::ProviderError;
use crate::lock::allocation_key;
use crate::resolver;
use netbox_client::{NetBoxError, Prefix, WritablePrefix};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Longest representable mask length (IPv6).
const MAX_PREFIX_LENGTH: i64 = 128;
/// Schema cap on the description attribute.
const MAX_DESCRIPTION_LENGTH: usize = 200;

/// Lifecycle controller for the available-prefix resource.
#[derive(Debug, Clone)]
pub struct AvailablePrefixResource {
    provider: Provider,
}

fn parse_resource_id(data: &ResourceData) -> Result<u64, ProviderError> {
    let id = data.id();
    id.parse()
        .map_err(|_| ProviderError::Parse(format!("resource ID {:?} is not numeric", id)))
}

fn not_found(err: NetBoxError, what: impl std::fmt::Display) -> ProviderError {
    match err {
        NetBoxError::NotFound(_) => ProviderError::NotFound(what.to_string()),
        other => ProviderError::NetBox(other),
    }
}

fn remote(err: NetBoxError, payload: &WritablePrefix) -> ProviderError {
    ProviderError::Remote {
        payload: serde_json::to_string(payload).unwrap_or_default(),
        source: err,
    }
}

fn prefix_length_of(cidr: &str) -> Result<i64, ProviderError> {
    cidr.rsplit_once('/')
        .and_then(|(_, len)| len.parse().ok())
        .ok_or_else(|| ProviderError::Parse(format!("malformed prefix CIDR {:?}", cidr)))
}

impl AvailablePrefixResource {
    /// Controller bound to one provider instance.
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    /// Allocate a new sub-prefix and populate state from the read-back.
    ///
    /// On failure no resource ID is left behind, so the host never persists a
    /// partial resource.
    pub async fn create(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        let parent_id = self.determine_parent_id(data).await?;

        let prefix_length = data.get_i64("prefix_length");
        if !(1..=MAX_PREFIX_LENGTH).contains(&prefix_length) {
            return Err(ProviderError::Validation(format!(
                "prefix_length must be between 1 and {}, got {}",
                MAX_PREFIX_LENGTH, prefix_length
            )));
        }

        let description = data.get_string("description");
        if description.len() > MAX_DESCRIPTION_LENGTH {
            return Err(ProviderError::Validation(format!(
                "description exceeds {} characters",
                MAX_DESCRIPTION_LENGTH
            )));
        }

        let mut payload = WritablePrefix {
            prefix_length: Some(prefix_length),
            ..Default::default()
        };

        self.resolve_foreign_keys(data, &mut payload).await?;

        let status: PrefixStatus = match data.get_ok("status").and_then(Value::as_str) {
            Some(label) => label.parse()?,
            None => PrefixStatus::Active,
        };
        payload.status = Some(status.encode(self.provider.status_encoding()));

        let flat = custom_fields::expand(data.get("custom_fields").unwrap_or(&Value::Null))?;
        if !flat.is_empty() {
            payload.custom_fields = Some(flat);
        }

        let tags = data.get_string_set("tags");
        if !tags.is_empty() {
            payload.tags = Some(tags);
        }
        if !description.is_empty() {
            payload.description = Some(description);
        }
        if data.get_bool("is_pool") {
            payload.is_pool = Some(true);
        }

        info!(
            "Allocating /{} prefix under parent {}",
            prefix_length, parent_id
        );

        // Hold the parent's lock for the allocation call only
        let allocated = {
            let _guard = self.provider.locks().lock(&allocation_key(parent_id)).await;
            self.provider
                .client()
                .create_available_prefix(parent_id, &payload)
                .await
        };

        let created = match allocated {
            Ok(prefix) => prefix,
            // The allocation endpoint answers 204 with a message body when
            // the parent has no free block of the requested length
            Err(err) if err.to_string().contains("204") => {
                warn!("Parent {} has no free /{} block", parent_id, prefix_length);
                return Err(ProviderError::InsufficientSpace { prefix_length });
            }
            Err(err) => return Err(remote(err, &payload)),
        };

        info!("Allocated prefix {} (id {})", created.prefix, created.id);
        data.set_id(created.id.to_string());
        self.read(data).await
    }

    /// Refresh every attribute from the remote record.
    ///
    /// Idempotent and side-effect-free; a missing remote record surfaces as
    /// `NotFound` so the caller can drop the resource from state.
    pub async fn read(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = parse_resource_id(data)?;
        let record = self
            .provider
            .client()
            .get_prefix(id)
            .await
            .map_err(|e| not_found(e, format!("prefix {} no longer exists", id)))?;

        debug!("Refreshing prefix {} from {}", id, record.prefix);

        data.set("prefix", &record.prefix)?;
        data.set("prefix_length", prefix_length_of(&record.prefix)?)?;
        data.set("family", record.family.value())?;
        data.set("status", PrefixStatus::decode(&record.status)?.label())?;
        data.set("description", &record.description)?;
        data.set("is_pool", record.is_pool)?;

        let mut tags: Vec<&str> = record.tags.iter().map(|t| t.name()).collect();
        tags.sort_unstable();
        tags.dedup();
        data.set("tags", tags)?;

        data.set("custom_fields", custom_fields::flatten(&record.custom_fields))?;
        data.set("created", &record.created)?;
        data.set("last_updated", &record.last_updated)?;

        data.set("site", record.site.as_ref().map_or("", |s| s.name.as_str()))?;
        data.set("vrf", record.vrf.as_ref().map_or("", |v| v.name.as_str()))?;
        data.set("tenant", record.tenant.as_ref().map_or("", |t| t.name.as_str()))?;
        data.set("vlan", record.vlan.as_ref().map_or("", |v| v.name.as_str()))?;
        data.set("role", record.role.as_ref().map_or("", |r| r.name.as_str()))?;

        if data.get_ok("parent_prefix").is_some() || data.get_ok("parent_prefix_id").is_some() {
            self.rediscover_parent(data, &record).await?;
        }
        Ok(())
    }

    /// Transmit changed mutable attributes as one partial update, then
    /// refresh. Immutable attribute changes are rejected; replacement is the
    /// host's job.
    pub async fn update(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        for immutable in ["prefix_length", "parent_prefix", "parent_prefix_id"] {
            if data.has_change(immutable) {
                return Err(ProviderError::Validation(format!(
                    "{} cannot be changed in place; the resource must be replaced",
                    immutable
                )));
            }
        }

        let id = parse_resource_id(data)?;
        // Partial updates always echo the current prefix alongside the
        // changed fields
        let mut payload = WritablePrefix {
            prefix: Some(data.get_string("prefix")),
            ..Default::default()
        };
        let mut changed = false;

        if data.has_change("status") {
            let status: PrefixStatus = data.get_string("status").parse()?;
            payload.status = Some(status.encode(self.provider.status_encoding()));
            changed = true;
        }
        if data.has_change("description") {
            let description = data.get_string("description");
            if description.len() > MAX_DESCRIPTION_LENGTH {
                return Err(ProviderError::Validation(format!(
                    "description exceeds {} characters",
                    MAX_DESCRIPTION_LENGTH
                )));
            }
            payload.description = Some(description);
            changed = true;
        }
        if data.has_change("is_pool") {
            payload.is_pool = Some(data.get_bool("is_pool"));
            changed = true;
        }
        if data.has_change("tags") {
            payload.tags = Some(data.get_string_set("tags"));
            changed = true;
        }
        if data.has_change("custom_fields") {
            let flat = custom_fields::expand(data.get("custom_fields").unwrap_or(&Value::Null))?;
            payload.custom_fields = Some(flat);
            changed = true;
        }
        if data.has_change("site") {
            if let Some(name) = data.get_ok("site").and_then(Value::as_str) {
                payload.site = Some(resolver::resolve_site(self.provider.client(), name).await?.id);
                changed = true;
            }
        }
        if data.has_change("vrf") {
            if let Some(name) = data.get_ok("vrf").and_then(Value::as_str) {
                payload.vrf = Some(resolver::resolve_vrf(self.provider.client(), name).await?);
                changed = true;
            }
        }
        if data.has_change("tenant") {
            if let Some(name) = data.get_ok("tenant").and_then(Value::as_str) {
                payload.tenant = Some(resolver::resolve_tenant(self.provider.client(), name).await?);
                changed = true;
            }
        }
        if data.has_change("vlan") {
            if let Some(name) = data.get_ok("vlan").and_then(Value::as_str) {
                payload.vlan = Some(resolver::resolve_vlan(self.provider.client(), name).await?);
                changed = true;
            }
        }
        if data.has_change("role") {
            if let Some(name) = data.get_ok("role").and_then(Value::as_str) {
                payload.role = Some(resolver::resolve_role(self.provider.client(), name).await?);
                changed = true;
            }
        }

        if changed {
            info!("Updating prefix {}", id);
            let result = {
                let _guard = self.provider.locks().lock(&allocation_key(id)).await;
                self.provider.client().update_prefix(id, &payload).await
            };
            result.map_err(|e| remote(e, &payload))?;
        } else {
            debug!("No mutable attribute changed for prefix {}", id);
        }

        self.read(data).await
    }

    /// Delete the remote prefix and clear the local identity.
    pub async fn delete(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = parse_resource_id(data)?;

        info!("Deleting prefix {}", id);
        let result = {
            let _guard = self.provider.locks().lock(&allocation_key(id)).await;
            self.provider.client().delete_prefix(id).await
        };
        result.map_err(|e| not_found(e, format!("prefix {} no longer exists", id)))?;

        data.clear_id();
        Ok(())
    }

    /// Reconstruct state from a bare remote ID.
    pub async fn import(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        self.read(data).await?;

        // Keep the structured representation deterministic even if the
        // remote record carried no custom-field map at all
        if data.get("custom_fields").is_none() {
            data.set("custom_fields", custom_fields::flatten(&Value::Null))?;
        }
        Ok(())
    }

    /// Resolve the parent the allocation targets.
    ///
    /// Exactly one of `parent_prefix` (CIDR, looked up remotely) and
    /// `parent_prefix_id` must be configured.
    async fn determine_parent_id(&self, data: &ResourceData) -> Result<u64, ProviderError> {
        let by_cidr = data.get_ok("parent_prefix").and_then(Value::as_str);
        let by_id = data.get_ok("parent_prefix_id").and_then(Value::as_i64);

        match (by_cidr, by_id) {
            (Some(_), Some(_)) | (None, None) => Err(ProviderError::Validation(
                "exactly one of parent_prefix and parent_prefix_id must be set".to_string(),
            )),
            (None, Some(id)) => Ok(id as u64),
            (Some(cidr), None) => {
                let net: ipnet::IpNet = cidr.parse().map_err(|_| {
                    ProviderError::Validation(format!("parent_prefix {:?} is not a valid CIDR", cidr))
                })?;
                let mask = net.prefix_len().to_string();
                let results = self
                    .provider
                    .client()
                    .query_prefixes(&[("within_include", cidr), ("mask_length", mask.as_str())], true)
                    .await?;
                results
                    .first()
                    .map(|p| p.id)
                    .ok_or_else(|| {
                        ProviderError::NotFound(format!("parent prefix {} not found", cidr))
                    })
            }
        }
    }

    /// Resolve configured foreign-key names into payload IDs.
    ///
    /// A configured name that does not resolve fails the operation; unset
    /// fields are simply omitted. When both site and tenant are given the
    /// site's own tenant must match.
    async fn resolve_foreign_keys(
        &self,
        data: &ResourceData,
        payload: &mut WritablePrefix,
    ) -> Result<(), ProviderError> {
        let client = self.provider.client();
        let tenant_name = data.get_ok("tenant").and_then(Value::as_str);

        if let Some(name) = data.get_ok("site").and_then(Value::as_str) {
            let site = resolver::resolve_site(client, name).await?;
            if let (Some(site_tenant), Some(requested)) = (site.tenant.as_ref(), tenant_name) {
                if site_tenant.name != requested {
                    return Err(ProviderError::Conflict(format!(
                        "site {} belongs to tenant {} but tenant {} was requested",
                        name, site_tenant.name, requested
                    )));
                }
            }
            payload.site = Some(site.id);
        }
        if let Some(name) = tenant_name {
            payload.tenant = Some(resolver::resolve_tenant(client, name).await?);
        }
        if let Some(name) = data.get_ok("vrf").and_then(Value::as_str) {
            payload.vrf = Some(resolver::resolve_vrf(client, name).await?);
        }
        if let Some(name) = data.get_ok("vlan").and_then(Value::as_str) {
            payload.vlan = Some(resolver::resolve_vlan(client, name).await?);
        }
        if let Some(name) = data.get_ok("role").and_then(Value::as_str) {
            payload.role = Some(resolver::resolve_role(client, name).await?);
        }
        Ok(())
    }

    /// Re-derive the parent from a containment query.
    ///
    /// The `contains` filter returns the child itself plus every ancestor;
    /// the immediately enclosing one is the true superset with the largest
    /// mask length.
    async fn rediscover_parent(
        &self,
        data: &mut ResourceData,
        record: &Prefix,
    ) -> Result<(), ProviderError> {
        let child: ipnet::IpNet = record
            .prefix
            .parse()
            .map_err(|_| ProviderError::Parse(format!("malformed prefix CIDR {:?}", record.prefix)))?;
        let vrf_id = record
            .vrf
            .as_ref()
            .map(|v| v.id.to_string())
            .unwrap_or_default();

        let candidates = self
            .provider
            .client()
            .query_prefixes(&[("contains", record.prefix.as_str()), ("vrf_id", vrf_id.as_str())], true)
            .await?;

        let parent = candidates
            .iter()
            .filter_map(|p| {
                let net: ipnet::IpNet = p.prefix.parse().ok()?;
                (net != child && net.contains(&child)).then_some((p, net.prefix_len()))
            })
            .max_by_key(|(_, mask)| *mask);

        if let Some((parent, _)) = parent {
            data.set("parent_prefix", &parent.prefix)?;
            data.set("parent_prefix_id", parent.id)?;
        } else {
            debug!("No enclosing parent found for {}", record.prefix);
        }
        Ok(())
    }
}
