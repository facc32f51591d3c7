//! Transport core for the incident-management REST API
//!
//! - [`ApiClient::dispatch`]: one authenticated request, classified failure
//! - [`ApiClient::collect_all`]: sequential, all-or-nothing pagination
//! - [`TokenSource`]: static key or OAuth2 client credentials with file
//!   cache and single-flight refresh
//!
//! Nothing here retries. Errors carry enough structure
//! ([`ClientError::is_temporary`], [`ClientError::is_rate_limited`], ...)
//! for callers to apply their own policy.

pub mod auth;
pub mod client;
pub mod debug;
pub mod errors;
pub mod oauth;
pub mod pagination;
pub mod request;
pub mod token_cache;

pub use auth::{StaticTokenSource, TokenSource};
pub use client::{ApiClient, ApiClientBuilder};
pub use debug::{CapturedRequest, CapturedResponse, DebugFlags};
pub use errors::{ClientError, ClientErrorCategory};
pub use oauth::{ClientCredentials, ClientCredentialsExchange, OAuthTokenSource, TokenExchange};
pub use pagination::{JsonPage, PageDecoder};
pub use request::{ApiRequest, ApiResponse, RequestContext};
pub use token_cache::TokenFileCache;
