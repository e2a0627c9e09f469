//! Encoding translation between the provider's canonical attribute values and
//! the representations the NetBox API uses, which changed across releases.

pub mod custom_fields;
pub mod status;
