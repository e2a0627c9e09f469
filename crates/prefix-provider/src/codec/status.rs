//! Prefix status codec
//!
//! NetBox changed the wire representation of the prefix status enumeration:
//! legacy releases (v2.4.x) use a numeric index, newer ones a lowercase label
//! (optionally wrapped in a `{value, label}` object on read). Which encoding
//! to write is a config-time choice; decoding accepts every form.

use crate::error::ProviderError;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The closed set of prefix statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixStatus {
    Container,
    Active,
    Reserved,
    Deprecated,
}

/// Which wire representation of `status` the target NetBox expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusEncoding {
    /// Lowercase string label (NetBox v2.5+)
    #[default]
    Label,
    /// Numeric index (NetBox v2.4.x)
    LegacyId,
}

impl PrefixStatus {
    /// All statuses, in legacy numeric-index order.
    pub const ALL: [PrefixStatus; 4] = [
        PrefixStatus::Container,
        PrefixStatus::Active,
        PrefixStatus::Reserved,
        PrefixStatus::Deprecated,
    ];

    /// Lowercase label, the canonical form.
    pub fn label(&self) -> &'static str {
        match self {
            PrefixStatus::Container => "container",
            PrefixStatus::Active => "active",
            PrefixStatus::Reserved => "reserved",
            PrefixStatus::Deprecated => "deprecated",
        }
    }

    /// Legacy numeric index (container=0, active=1, reserved=2, deprecated=3).
    pub fn legacy_id(&self) -> u8 {
        match self {
            PrefixStatus::Container => 0,
            PrefixStatus::Active => 1,
            PrefixStatus::Reserved => 2,
            PrefixStatus::Deprecated => 3,
        }
    }

    fn from_legacy_id(id: u64) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// Encode for transmission under the given encoding.
    pub fn encode(&self, encoding: StatusEncoding) -> Value {
        match encoding {
            StatusEncoding::Label => Value::String(self.label().to_string()),
            StatusEncoding::LegacyId => Value::from(self.legacy_id()),
        }
    }

    /// Decode any wire form: bare label, legacy numeric, or `{value, label}`.
    pub fn decode(value: &Value) -> Result<Self, ProviderError> {
        match value {
            Value::String(s) => s.parse(),
            Value::Number(n) => n
                .as_u64()
                .and_then(Self::from_legacy_id)
                .ok_or_else(|| ProviderError::Validation(format!("unknown status id {}", n))),
            Value::Object(obj) => {
                // Newer serializers wrap the choice as {value, label}
                let inner = obj
                    .get("value")
                    .or_else(|| obj.get("label"))
                    .ok_or_else(|| {
                        ProviderError::Validation("status object has no value or label".to_string())
                    })?;
                Self::decode(inner)
            }
            other => Err(ProviderError::Validation(format!(
                "unrecognized status representation: {}",
                other
            ))),
        }
    }
}

impl FromStr for PrefixStatus {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "container" => Ok(PrefixStatus::Container),
            "active" => Ok(PrefixStatus::Active),
            "reserved" => Ok(PrefixStatus::Reserved),
            "deprecated" => Ok(PrefixStatus::Deprecated),
            other => Err(ProviderError::Validation(format!(
                "invalid status {:?}: must be one of container, active, reserved, deprecated",
                other
            ))),
        }
    }
}

impl fmt::Display for PrefixStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
