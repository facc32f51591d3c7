//! Inbound webhook payloads
//!
//! Decoded only after the delivery's signature has been verified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::api_object::ApiObject;

/// Top-level webhook delivery body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookMessage {
    pub event: WebhookEvent,
}

impl WebhookMessage {
    /// Decode a delivery body.
    ///
    /// # Errors
    /// Returns the JSON error when the body is not a webhook message.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// A single event carried by a webhook delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    /// e.g. `incident.triggered`
    pub event_type: String,
    pub resource_type: String,
    pub occurred_at: DateTime<Utc>,
    /// Actor that caused the event, when known
    #[serde(default)]
    pub agent: Option<ApiObject>,
    /// Integration that caused the event, when known
    #[serde(default)]
    pub client: Option<serde_json::Value>,
    /// Resource snapshot; shape depends on `resource_type`
    #[serde(default)]
    pub data: serde_json::Value,
}
