//! Structured resource data
//!
//! The host hands every lifecycle call a get/set/diff view over the
//! resource's attributes: the currently configured values, the previously
//! stored values, and the resource identity. `ResourceData` is that view made
//! concrete, backed by JSON value maps so it can carry any schema field.
//!
//! `get_ok` follows the host's zero-value convention: an empty string, zero,
//! false, or an empty collection counts as "not set".

use crate::error::ProviderError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute view of one resource instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceData {
    current: BTreeMap<String, Value>,
    prior: BTreeMap<String, Value>,
    id: Option<String>,
}

fn is_zero_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Bool(b) => !b,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

impl ResourceData {
    /// Empty resource data, as the host provides for a brand-new resource.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource data seeded from configured attribute values.
    pub fn from_config(config: BTreeMap<String, Value>) -> Self {
        Self {
            current: config,
            prior: BTreeMap::new(),
            id: None,
        }
    }

    /// Raw attribute value, if any.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.current.get(field)
    }

    /// Attribute value only when it is set to a non-zero value.
    pub fn get_ok(&self, field: &str) -> Option<&Value> {
        self.current.get(field).filter(|v| !is_zero_value(v))
    }

    /// String attribute, empty when unset.
    pub fn get_string(&self, field: &str) -> String {
        self.current
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Integer attribute, zero when unset.
    pub fn get_i64(&self, field: &str) -> i64 {
        self.current
            .get(field)
            .and_then(Value::as_i64)
            .unwrap_or_default()
    }

    /// Boolean attribute, false when unset.
    pub fn get_bool(&self, field: &str) -> bool {
        self.current
            .get(field)
            .and_then(Value::as_bool)
            .unwrap_or_default()
    }

    /// String-set attribute, deduplicated and sorted for stable diffing.
    pub fn get_string_set(&self, field: &str) -> Vec<String> {
        let mut items: Vec<String> = self
            .current
            .get(field)
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        items.sort();
        items.dedup();
        items
    }

    /// Store an attribute value.
    pub fn set(&mut self, field: &str, value: impl Serialize) -> Result<(), ProviderError> {
        let value = serde_json::to_value(value)
            .map_err(|e| ProviderError::Parse(format!("cannot store field {}: {}", field, e)))?;
        self.current.insert(field.to_string(), value);
        Ok(())
    }

    /// Whether the attribute differs from the previously stored value.
    pub fn has_change(&self, field: &str) -> bool {
        let old = self.prior.get(field).unwrap_or(&Value::Null);
        let new = self.current.get(field).unwrap_or(&Value::Null);
        old != new
    }

    /// Persist the current values as the prior state, as the host does after
    /// a successful apply. Subsequent `has_change` calls diff against this.
    pub fn commit(&mut self) {
        self.prior = self.current.clone();
    }

    /// The resource identity, empty string when unset (host convention).
    pub fn id(&self) -> String {
        self.id.clone().unwrap_or_default()
    }

    /// Assign the resource identity.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Clear the resource identity, signalling "no longer exists".
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// True until the resource has been assigned a remote identity.
    pub fn is_new_resource(&self) -> bool {
        self.id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_ok_filters_zero_values() {
        let mut data = ResourceData::new();
        data.set("empty", "").unwrap();
        data.set("zero", 0).unwrap();
        data.set("unset_flag", false).unwrap();
        data.set("name", "edge-pool").unwrap();
        data.set("length", 28).unwrap();

        assert!(data.get_ok("empty").is_none());
        assert!(data.get_ok("zero").is_none());
        assert!(data.get_ok("unset_flag").is_none());
        assert!(data.get_ok("missing").is_none());
        assert_eq!(data.get_ok("name"), Some(&json!("edge-pool")));
        assert_eq!(data.get_ok("length"), Some(&json!(28)));
    }

    #[test]
    fn string_set_is_sorted_and_deduplicated() {
        let mut data = ResourceData::new();
        data.set("tags", vec!["prod", "edge", "prod", "core"]).unwrap();

        assert_eq!(data.get_string_set("tags"), vec!["core", "edge", "prod"]);
    }

    #[test]
    fn has_change_diffs_against_committed_state() {
        let mut data = ResourceData::new();
        data.set("description", "old").unwrap();
        data.set("is_pool", true).unwrap();
        data.commit();

        data.set("description", "new").unwrap();

        assert!(data.has_change("description"));
        assert!(!data.has_change("is_pool"));
        assert!(!data.has_change("never_set"));
    }

    #[test]
    fn identity_lifecycle() {
        let mut data = ResourceData::new();
        assert!(data.is_new_resource());
        assert_eq!(data.id(), "");

        data.set_id("42");
        assert!(!data.is_new_resource());
        assert_eq!(data.id(), "42");

        data.clear_id();
        assert!(data.is_new_resource());
    }
}
