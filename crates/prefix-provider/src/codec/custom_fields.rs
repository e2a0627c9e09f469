//! Custom-field codec
//!
//! The resource schema models custom fields as a single structured block with
//! three fixed sub-fields; the REST payload wants a flat string-keyed map.
//! An empty string and an absent key mean the same thing, so both directions
//! normalize accordingly and never report a diff between the two.

use crate::error::ProviderError;
use serde_json::{Map, Value};

/// The custom-field keys the prefix schema knows about.
pub const CUSTOM_FIELD_KEYS: [&str; 3] = ["helpers", "ipv4_acl_in", "ipv4_acl_out"];

/// Structured block → flat map for the write payload.
///
/// The schema enforces at most one block element; more than one is a shape
/// error and aborts the operation. Empty-string sub-fields are dropped.
pub fn expand(block: &Value) -> Result<Map<String, Value>, ProviderError> {
    let elements = match block {
        Value::Null => return Ok(Map::new()),
        Value::Array(a) => a.as_slice(),
        other => {
            return Err(ProviderError::Shape(format!(
                "custom_fields must be a block list, got {}",
                other
            )));
        }
    };

    if elements.len() > 1 {
        return Err(ProviderError::Shape(format!(
            "custom_fields accepts at most one block, got {}",
            elements.len()
        )));
    }

    let mut flat = Map::new();
    let Some(element) = elements.first() else {
        return Ok(flat);
    };
    let fields = element.as_object().ok_or_else(|| {
        ProviderError::Shape(format!("custom_fields block must be a map, got {}", element))
    })?;

    for key in CUSTOM_FIELD_KEYS {
        match fields.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if s.is_empty() => {}
            Some(Value::String(s)) => {
                flat.insert(key.to_string(), Value::String(s.clone()));
            }
            Some(other) => {
                return Err(ProviderError::Shape(format!(
                    "custom field {} must be a string, got {}",
                    key, other
                )));
            }
        }
    }
    Ok(flat)
}

/// Flat map from a read-back record → single-element structured block.
///
/// Only the known keys are copied; each defaults to the empty string when
/// absent, keeping the structured representation deterministic after import.
pub fn flatten(flat: &Value) -> Vec<Value> {
    let source = flat.as_object();
    let mut element = Map::new();
    for key in CUSTOM_FIELD_KEYS {
        let value = source
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default();
        element.insert(key.to_string(), Value::String(value.to_string()));
    }
    vec![Value::Object(element)]
}
