//! Wire-level constants
//!
//! Endpoints, header names and limits shared by the transport core.

/// Library version reported in the User-Agent header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Product token prefixed to every User-Agent.
pub const USER_AGENT_PRODUCT: &str = "pagerline";

// REST API
pub const DEFAULT_API_ENDPOINT: &str = "https://api.pagerline.com";
/// Pins the wire-format version for every request.
pub const ACCEPT_HEADER: &str = "application/vnd.pagerline+json;version=2";
pub const CONTENT_TYPE_JSON: &str = "application/json";

// OAuth2
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://identity.pagerline.com/oauth/token";
pub const DEFAULT_TOKEN_REFRESH_THRESHOLD_SECS: i64 = 10;

// Pagination query parameters
pub const QUERY_OFFSET: &str = "offset";
pub const QUERY_LIMIT: &str = "limit";
pub const QUERY_TOTAL: &str = "total";

// Webhooks
pub const WEBHOOK_SIGNATURE_HEADER: &str = "X-Pagerline-Signature";
/// Upper bound on a webhook body read during verification (2 MiB).
pub const WEBHOOK_BODY_LIMIT: usize = 2 * 1024 * 1024;

// Client defaults
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
