//! Integration tests for NetBox client
//!
//! These tests require a running NetBox instance.
//! Set NETBOX_URL and NETBOX_TOKEN environment variables to run.

use netbox_client::{NetBoxClient, WritablePrefix};
use std::time::Duration;

fn client() -> NetBoxClient {
    let url = std::env::var("NETBOX_URL")
        .unwrap_or_else(|_| "http://localhost:8001".to_string());
    let token = std::env::var("NETBOX_TOKEN")
        .expect("NETBOX_TOKEN environment variable must be set");

    NetBoxClient::new(url, token, Duration::from_secs(30)).expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires running NetBox instance
async fn test_token_validation() {
    let client = client();

    client.validate_token().await.expect("Token validation failed");
}

#[tokio::test]
#[ignore]
async fn test_query_prefixes() {
    let client = client();

    let prefixes = client.query_prefixes(&[], false).await
        .expect("Failed to query prefixes");

    println!("Found {} prefixes", prefixes.len());
}

#[tokio::test]
#[ignore]
async fn test_query_prefixes_within() {
    let client = client();

    // Containment filter used during parent discovery
    let prefixes = client
        .query_prefixes(&[("within_include", "10.0.0.0/8")], true)
        .await
        .expect("Failed to query prefixes");

    for p in &prefixes {
        println!("{} (id {})", p.prefix, p.id);
    }
}

#[tokio::test]
#[ignore]
async fn test_allocate_and_delete_prefix() {
    let client = client();

    // Needs an existing pool prefix; adjust the id to your instance
    let parent_id: u64 = std::env::var("NETBOX_TEST_PARENT_ID")
        .expect("NETBOX_TEST_PARENT_ID must be set")
        .parse()
        .expect("NETBOX_TEST_PARENT_ID must be numeric");

    let payload = WritablePrefix {
        prefix_length: Some(28),
        description: Some("Integration test allocation".to_string()),
        ..Default::default()
    };

    let allocated = client.create_available_prefix(parent_id, &payload).await;

    if let Ok(prefix) = allocated {
        println!("Allocated prefix: {} (id {})", prefix.prefix, prefix.id);

        client.delete_prefix(prefix.id).await
            .expect("Failed to delete allocated prefix");
        println!("Deleted prefix {}", prefix.id);
    } else {
        println!("Allocation failed: {:?}", allocated.err());
    }
}

#[tokio::test]
#[ignore]
async fn test_query_lookup_endpoints() {
    let client = client();

    let sites = client.query_sites(&[], false).await.expect("Failed to query sites");
    let roles = client.query_roles(&[], false).await.expect("Failed to query roles");
    let vrfs = client.query_vrfs(&[], false).await.expect("Failed to query VRFs");
    let tenants = client.query_tenants(&[], false).await.expect("Failed to query tenants");

    println!(
        "sites={} roles={} vrfs={} tenants={}",
        sites.len(),
        roles.len(),
        vrfs.len(),
        tenants.len()
    );
}
