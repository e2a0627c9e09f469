//! NetBox API models
//!
//! These models match the NetBox REST API serializers for the IPAM, DCIM and
//! tenancy endpoints the available-prefix workflow touches. Fields whose wire
//! representation changed across NetBox releases (status, family, tags) are
//! kept version-tolerant here; interpreting them is the caller's job.

use serde::{Deserialize, Serialize};

/// Address family of a prefix.
///
/// Older NetBox releases return the bare numeric value (4 or 6), newer ones a
/// `{value, label}` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Family {
    /// Bare numeric form
    Value(u8),
    /// `{value, label}` object form
    Labeled {
        /// 4 or 6
        value: u8,
        /// Display label, e.g. "IPv4"
        label: String,
    },
}

impl Family {
    /// The numeric family value: 4 or 6
    pub fn value(&self) -> u8 {
        match self {
            Family::Value(v) => *v,
            Family::Labeled { value, .. } => *value,
        }
    }
}

/// A tag attached to a prefix.
///
/// Older NetBox releases return plain strings, newer ones nested objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// Plain string form
    Name(String),
    /// Nested object form
    Nested {
        /// Tag name
        name: String,
        /// Tag slug
        #[serde(default)]
        slug: String,
    },
}

impl TagValue {
    /// The tag's name regardless of wire form
    pub fn name(&self) -> &str {
        match self {
            TagValue::Name(name) => name,
            TagValue::Nested { name, .. } => name,
        }
    }
}

/// Prefix model matching NetBox PrefixSerializer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prefix {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub display: String,
    pub family: Family,
    /// CIDR string, e.g. "10.0.0.0/24"
    pub prefix: String,
    pub site: Option<NestedSite>,
    pub vrf: Option<NestedVrf>,
    pub tenant: Option<NestedTenant>,
    pub vlan: Option<NestedVlan>,
    pub role: Option<NestedRole>,
    /// Raw status value; numeric, string, or `{value, label}` depending on
    /// the API version
    #[serde(default)]
    pub status: serde_json::Value,
    #[serde(default)]
    pub is_pool: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<TagValue>,
    /// Flat key/value custom-field map
    #[serde(default)]
    pub custom_fields: serde_json::Value,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub last_updated: String,
}

/// Write payload for prefix creation and partial update.
///
/// Every field is optional and skipped when unset, so the same type serves
/// both the available-prefixes POST (prefix_length + attributes) and PATCH
/// partial updates (changed attributes only).
#[derive(Debug, Clone, Default, Serialize)]
pub struct WritablePrefix {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrf: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pool: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Site model (from DCIM API); the nested tenant is needed for the
/// site/tenant compatibility check at prefix-creation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub tenant: Option<NestedTenant>,
}

/// IPAM role model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// VLAN model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vlan {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub vid: u16,
}

/// VRF model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vrf {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    pub name: String,
    /// Route distinguisher
    #[serde(default)]
    pub rd: Option<String>,
}

/// Tenant model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

// Nested serializers (simplified versions for references)

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedSite {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedVrf {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedTenant {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedVlan {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub vid: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedRole {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}
