//! Domain types and models

pub mod api_object;
pub mod credential;
pub mod pagination;
pub mod webhook;

pub use api_object::ApiObject;
pub use credential::{Credential, OAuthToken, PersistedToken};
pub use pagination::{ListOptions, ListStats, PageEnvelope};
pub use webhook::{WebhookEvent, WebhookMessage};
