//! Shared identity/reference shape
//!
//! Nearly every remote resource carries the same five reference fields.
//! Resource types compose this struct with `#[serde(flatten)]` instead of
//! redeclaring the fields.

use serde::{Deserialize, Serialize};

/// Reference fields common to every API resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiObject {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Resource discriminator, e.g. `user_reference`
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Canonical API URL of the resource (`self` on the wire)
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

impl ApiObject {
    /// Build a bare reference (id + type), the form accepted in request bodies.
    #[must_use]
    pub fn reference(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { id: id.into(), kind: kind.into(), ..Self::default() }
    }
}
