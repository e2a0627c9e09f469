//! Name resolution
//!
//! Resource attributes reference sites, roles, VLANs, VRFs and tenants by
//! human-readable name; the write payload wants their numeric IDs. Each
//! resolver issues an exact-name list query with no artificial result cap and
//! takes the first match (NetBox enforces per-type name uniqueness, so ties
//! do not occur in practice).

use crate::error::ProviderError;
use netbox_client::{NetBoxClientTrait, Site};
use tracing::debug;

/// Resolve a site name to its full record.
///
/// Returns the whole site rather than just the ID: the site's own tenant is
/// needed for the tenant-compatibility check at creation time.
pub async fn resolve_site(
    client: &dyn NetBoxClientTrait,
    name: &str,
) -> Result<Site, ProviderError> {
    debug!("Resolving site {:?}", name);
    let results = client.query_sites(&[("name", name)], true).await?;
    results
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::NotFound(format!("site {:?} not found", name)))
}

/// Resolve an IPAM role name to its ID.
pub async fn resolve_role(
    client: &dyn NetBoxClientTrait,
    name: &str,
) -> Result<u64, ProviderError> {
    debug!("Resolving role {:?}", name);
    let results = client.query_roles(&[("name", name)], true).await?;
    results
        .first()
        .map(|r| r.id)
        .ok_or_else(|| ProviderError::NotFound(format!("role {:?} not found", name)))
}

/// Resolve a VLAN name to its ID.
pub async fn resolve_vlan(
    client: &dyn NetBoxClientTrait,
    name: &str,
) -> Result<u64, ProviderError> {
    debug!("Resolving VLAN {:?}", name);
    let results = client.query_vlans(&[("name", name)], true).await?;
    results
        .first()
        .map(|v| v.id)
        .ok_or_else(|| ProviderError::NotFound(format!("VLAN {:?} not found", name)))
}

/// Resolve a VRF name to its ID.
pub async fn resolve_vrf(
    client: &dyn NetBoxClientTrait,
    name: &str,
) -> Result<u64, ProviderError> {
    debug!("Resolving VRF {:?}", name);
    let results = client.query_vrfs(&[("name", name)], true).await?;
    results
        .first()
        .map(|v| v.id)
        .ok_or_else(|| ProviderError::NotFound(format!("VRF {:?} not found", name)))
}

/// Resolve a tenant name to its ID.
pub async fn resolve_tenant(
    client: &dyn NetBoxClientTrait,
    name: &str,
) -> Result<u64, ProviderError> {
    debug!("Resolving tenant {:?}", name);
    let results = client.query_tenants(&[("name", name)], true).await?;
    results
        .first()
        .map(|t| t.id)
        .ok_or_else(|| ProviderError::NotFound(format!("tenant {:?} not found", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use netbox_client::{MockNetBoxClient, Role, Tenant};

    #[tokio::test]
    async fn resolves_by_exact_name() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_role(Role {
            id: 12,
            url: String::new(),
            name: "backbone".to_string(),
            slug: "backbone".to_string(),
        });

        assert_eq!(resolve_role(&mock, "backbone").await.unwrap(), 12);
    }

    #[tokio::test]
    async fn missing_name_is_not_found() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_tenant(Tenant {
            id: 3,
            url: String::new(),
            name: "acme".to_string(),
            slug: "acme".to_string(),
        });

        let err = resolve_tenant(&mock, "globex").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }
}
