//! Prefix search datasource
//!
//! Read-only lookup of existing prefixes by CIDR. A single match exposes the
//! matched record's attributes; when several prefixes share the CIDR across
//! VRFs, every match's ID is reported and the datasource identity becomes the
//! composite `"<prefix>/<id0>_<id1>_..."` form.

use crate::codec::status::PrefixStatus;
use crate::config::Provider;
use crate::data::ResourceData;
use crate::error::ProviderError;
use tracing::debug;

/// Datasource over existing prefixes.
#[derive(Debug, Clone)]
pub struct PrefixSearch {
    provider: Provider,
}

impl PrefixSearch {
    /// Datasource bound to one provider instance.
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    /// Look up prefixes matching the configured CIDR and populate state from
    /// the first match.
    pub async fn read(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        let cidr = data.get_string("prefix");
        let net: ipnet::IpNet = cidr
            .parse()
            .map_err(|_| ProviderError::Validation(format!("prefix {:?} is not a valid CIDR", cidr)))?;
        let mask = net.prefix_len().to_string();

        let results = self
            .provider
            .client()
            .query_prefixes(
                &[("within_include", cidr.as_str()), ("mask_length", mask.as_str())],
                true,
            )
            .await?;

        let Some(first) = results.first() else {
            return Err(ProviderError::NotFound(format!("no prefix matches {}", cidr)));
        };
        debug!("Prefix search for {} matched {} record(s)", cidr, results.len());

        data.set("prefix", &first.prefix)?;
        data.set("family", first.family.value())?;
        data.set("status", PrefixStatus::decode(&first.status)?.label())?;
        data.set("description", &first.description)?;
        data.set("is_pool", first.is_pool)?;
        data.set("vrf", first.vrf.as_ref().map_or("", |v| v.name.as_str()))?;

        let ids: Vec<u64> = results.iter().map(|p| p.id).collect();
        data.set("prefix_ids", &ids)?;

        if let [only] = ids.as_slice() {
            data.set_id(only.to_string());
        } else {
            let joined: Vec<String> = ids.iter().map(u64::to_string).collect();
            data.set_id(format!("{}/{}", cidr, joined.join("_")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::status::StatusEncoding;
    use netbox_client::MockNetBoxClient;
    use std::sync::Arc;

    fn search(mock: &MockNetBoxClient) -> PrefixSearch {
        PrefixSearch::new(Provider::with_client(
            Arc::new(mock.clone()),
            StatusEncoding::Label,
        ))
    }

    #[tokio::test]
    async fn single_match_uses_the_record_id() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_prefix(mock.make_prefix(42, "10.2.0.0/24"));

        let mut data = ResourceData::new();
        data.set("prefix", "10.2.0.0/24").unwrap();
        search(&mock).read(&mut data).await.expect("read failed");

        assert_eq!(data.id(), "42");
        assert_eq!(data.get_string("status"), "active");
        assert_eq!(data.get_i64("family"), 4);
    }

    #[tokio::test]
    async fn multiple_matches_build_a_composite_id() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_prefix(mock.make_prefix(7, "10.3.0.0/24"));
        mock.add_prefix(mock.make_prefix(8, "10.3.0.0/24"));

        let mut data = ResourceData::new();
        data.set("prefix", "10.3.0.0/24").unwrap();
        search(&mock).read(&mut data).await.expect("read failed");

        assert_eq!(data.id(), "10.3.0.0/24/7_8");
        assert_eq!(data.get("prefix_ids"), Some(&serde_json::json!([7, 8])));
    }

    #[tokio::test]
    async fn no_match_is_not_found() {
        let mock = MockNetBoxClient::new("http://test-netbox");

        let mut data = ResourceData::new();
        data.set("prefix", "10.9.0.0/24").unwrap();

        assert!(matches!(
            search(&mock).read(&mut data).await,
            Err(ProviderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn malformed_cidr_fails_validation() {
        let mock = MockNetBoxClient::new("http://test-netbox");

        let mut data = ResourceData::new();
        data.set("prefix", "not-a-cidr").unwrap();

        assert!(matches!(
            search(&mock).read(&mut data).await,
            Err(ProviderError::Validation(_))
        ));
    }
}
