//! Unit tests for the available-prefix lifecycle

#[cfg(test)]
mod tests {
    use crate::codec::status::StatusEncoding;
    use crate::config::Provider;
    use crate::data::ResourceData;
    use crate::error::ProviderError;
    use crate::resource::available_prefix::AvailablePrefixResource;
    use netbox_client::{MockNetBoxClient, NestedTenant, NetBoxClientTrait, Site, Tenant};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn controller(mock: &MockNetBoxClient) -> AvailablePrefixResource {
        controller_with_encoding(mock, StatusEncoding::Label)
    }

    fn controller_with_encoding(
        mock: &MockNetBoxClient,
        encoding: StatusEncoding,
    ) -> AvailablePrefixResource {
        AvailablePrefixResource::new(Provider::with_client(Arc::new(mock.clone()), encoding))
    }

    fn request(parent_id: u64, prefix_length: i64) -> ResourceData {
        let mut data = ResourceData::new();
        data.set("parent_prefix_id", parent_id).unwrap();
        data.set("prefix_length", prefix_length).unwrap();
        data
    }

    #[tokio::test]
    async fn test_create_allocates_requested_length() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_parent_prefix(100, "10.0.0.0/16", &["10.0.0.0/28", "10.0.0.16/28"]);

        let resource = controller(&mock);
        let mut data = request(100, 28);

        resource.create(&mut data).await.expect("create failed");

        assert!(!data.id().is_empty());
        assert_eq!(data.get_string("prefix"), "10.0.0.0/28");
        assert_eq!(data.get_i64("prefix_length"), 28);
        assert_eq!(data.get_i64("family"), 4);
        assert_eq!(data.get_string("status"), "active");
        // Parent rediscovered from the containment query
        assert_eq!(data.get_string("parent_prefix"), "10.0.0.0/16");
        assert_eq!(data.get_i64("parent_prefix_id"), 100);
    }

    #[tokio::test]
    async fn test_create_exhausted_parent_is_insufficient_space() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_parent_prefix(100, "10.0.0.0/16", &[]);

        let resource = controller(&mock);
        let mut data = request(100, 28);

        let err = resource.create(&mut data).await.unwrap_err();
        assert!(matches!(err, ProviderError::InsufficientSpace { prefix_length: 28 }));
        assert!(err.to_string().contains("28"));
        // No dangling identity after a failed create
        assert!(data.is_new_resource());
    }

    #[tokio::test]
    async fn test_create_requires_exactly_one_parent_field() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_parent_prefix(100, "10.0.0.0/16", &["10.0.0.0/28"]);
        let resource = controller(&mock);

        let mut neither = ResourceData::new();
        neither.set("prefix_length", 28).unwrap();
        assert!(matches!(
            resource.create(&mut neither).await,
            Err(ProviderError::Validation(_))
        ));

        let mut both = request(100, 28);
        both.set("parent_prefix", "10.0.0.0/16").unwrap();
        assert!(matches!(
            resource.create(&mut both).await,
            Err(ProviderError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_resolves_parent_by_cidr() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_parent_prefix(100, "10.0.0.0/16", &["10.0.0.0/28"]);

        let resource = controller(&mock);
        let mut data = ResourceData::new();
        data.set("parent_prefix", "10.0.0.0/16").unwrap();
        data.set("prefix_length", 28).unwrap();

        resource.create(&mut data).await.expect("create failed");
        assert_eq!(data.get_string("prefix"), "10.0.0.0/28");
    }

    #[tokio::test]
    async fn test_create_site_tenant_conflict() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_parent_prefix(100, "10.0.0.0/16", &["10.0.0.0/28"]);
        mock.add_site(Site {
            id: 5,
            url: String::new(),
            name: "dc1".to_string(),
            slug: "dc1".to_string(),
            tenant: Some(NestedTenant {
                id: 9,
                url: String::new(),
                name: "acme".to_string(),
                slug: "acme".to_string(),
            }),
        });
        mock.add_tenant(Tenant {
            id: 10,
            url: String::new(),
            name: "globex".to_string(),
            slug: "globex".to_string(),
        });

        let resource = controller(&mock);
        let mut data = request(100, 28);
        data.set("site", "dc1").unwrap();
        data.set("tenant", "globex").unwrap();

        let err = resource.create(&mut data).await.unwrap_err();
        assert!(matches!(err, ProviderError::Conflict(_)));
        assert!(err.to_string().contains("acme"));
        assert!(err.to_string().contains("globex"));
    }

    #[tokio::test]
    async fn test_create_unresolvable_name_is_hard_error() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_parent_prefix(100, "10.0.0.0/16", &["10.0.0.0/28"]);

        let resource = controller(&mock);
        let mut data = request(100, 28);
        data.set("role", "no-such-role").unwrap();

        assert!(matches!(
            resource.create(&mut data).await,
            Err(ProviderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_with_legacy_status_encoding() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_parent_prefix(100, "10.0.0.0/16", &["10.0.0.0/28"]);

        let resource = controller_with_encoding(&mock, StatusEncoding::LegacyId);
        let mut data = request(100, 28);
        data.set("status", "reserved").unwrap();

        resource.create(&mut data).await.expect("create failed");

        // The remote record holds the numeric form; read decodes it back
        assert_eq!(data.get_string("status"), "reserved");
        let record = mock.get_prefix(data.id().parse().unwrap()).await.unwrap();
        assert_eq!(record.status, json!(2));
    }

    #[tokio::test]
    async fn test_concurrent_creates_never_overlap() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_parent_prefix(100, "10.0.0.0/16", &["10.0.0.0/28", "10.0.0.16/28"]);
        mock.set_alloc_delay(Duration::from_millis(20));

        let resource = controller(&mock);
        let first = {
            let resource = resource.clone();
            tokio::spawn(async move {
                let mut data = request(100, 28);
                resource.create(&mut data).await.map(|_| data.get_string("prefix"))
            })
        };
        let second = {
            let resource = resource.clone();
            tokio::spawn(async move {
                let mut data = request(100, 28);
                resource.create(&mut data).await.map(|_| data.get_string("prefix"))
            })
        };

        let first = first.await.unwrap().expect("first create failed");
        let second = second.await.unwrap().expect("second create failed");
        assert_ne!(first, second, "both creates were handed the same block");

        let mut intervals = mock.allocation_intervals();
        intervals.sort_by_key(|(start, _)| *start);
        assert_eq!(intervals.len(), 2);
        let (_, first_end) = intervals[0];
        let (second_start, _) = intervals[1];
        assert!(
            first_end <= second_start,
            "allocation calls overlapped in time"
        );
    }

    #[tokio::test]
    async fn test_read_is_idempotent() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_parent_prefix(100, "10.0.0.0/16", &["10.0.0.0/28"]);

        let resource = controller(&mock);
        let mut data = request(100, 28);
        data.set("tags", vec!["edge", "prod"]).unwrap();
        resource.create(&mut data).await.expect("create failed");

        resource.read(&mut data).await.expect("first read failed");
        let snapshot = data.clone();
        resource.read(&mut data).await.expect("second read failed");

        assert_eq!(data, snapshot);
    }

    #[tokio::test]
    async fn test_tags_only_update_sends_one_minimal_payload() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_parent_prefix(100, "10.0.0.0/16", &["10.0.0.0/28"]);

        let resource = controller(&mock);
        let mut data = request(100, 28);
        data.set("tags", vec!["edge"]).unwrap();
        resource.create(&mut data).await.expect("create failed");
        data.commit();

        data.set("tags", vec!["prod", "edge"]).unwrap();
        resource.update(&mut data).await.expect("update failed");

        let payloads = mock.update_payloads();
        assert_eq!(payloads.len(), 1, "expected exactly one partial update");
        let (_, payload) = &payloads[0];
        let fields = payload.as_object().unwrap();
        let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["prefix", "tags"]);
        assert_eq!(fields["tags"], json!(["edge", "prod"]));
    }

    #[tokio::test]
    async fn test_update_rejects_immutable_changes() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_parent_prefix(100, "10.0.0.0/16", &["10.0.0.0/28"]);

        let resource = controller(&mock);
        let mut data = request(100, 28);
        resource.create(&mut data).await.expect("create failed");
        data.commit();

        data.set("prefix_length", 29).unwrap();
        let err = resource.update(&mut data).await.unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(mock.update_payloads().is_empty(), "no update may be sent");
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_status() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_parent_prefix(100, "10.0.0.0/16", &["10.0.0.0/28"]);

        let resource = controller(&mock);
        let mut data = request(100, 28);
        resource.create(&mut data).await.expect("create failed");
        data.commit();

        data.set("status", "archived").unwrap();
        let err = resource.update(&mut data).await.unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(mock.update_payloads().is_empty());
    }

    #[tokio::test]
    async fn test_delete_clears_identity() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_parent_prefix(100, "10.0.0.0/16", &["10.0.0.0/28"]);

        let resource = controller(&mock);
        let mut data = request(100, 28);
        resource.create(&mut data).await.expect("create failed");
        let id: u64 = data.id().parse().unwrap();

        resource.delete(&mut data).await.expect("delete failed");
        assert!(data.is_new_resource());
        assert!(mock.get_prefix(id).await.is_err());
    }

    #[tokio::test]
    async fn test_read_after_remote_removal_is_not_found() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_parent_prefix(100, "10.0.0.0/16", &["10.0.0.0/28"]);

        let resource = controller(&mock);
        let mut data = request(100, 28);
        resource.create(&mut data).await.expect("create failed");

        // Removed out of band, e.g. directly in the NetBox UI
        let id: u64 = data.id().parse().unwrap();
        mock.delete_prefix(id).await.unwrap();

        assert!(matches!(
            resource.read(&mut data).await,
            Err(ProviderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_import_populates_custom_fields() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        let mut record = mock.make_prefix(77, "10.1.0.0/24");
        record.custom_fields = serde_json::Value::Null;
        mock.add_prefix(record);

        let resource = controller(&mock);
        let mut data = ResourceData::new();
        data.set_id("77");

        resource.import(&mut data).await.expect("import failed");

        assert_eq!(data.get_string("prefix"), "10.1.0.0/24");
        assert_eq!(
            data.get("custom_fields"),
            Some(&json!([{"helpers": "", "ipv4_acl_in": "", "ipv4_acl_out": ""}]))
        );
    }
}
