//! Client configuration structures
//!
//! Deserialized from JSON or TOML by the infra config loader, or built in
//! code. Secrets are redacted from `Debug` output.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_API_ENDPOINT, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_ENDPOINT};

/// Top-level client configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base REST endpoint; override for test doubles or regional endpoints
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Per-request timeout applied by the HTTP transport
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Appended to the library's own User-Agent product token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent_suffix: Option<String>,

    pub auth: AuthConfig,
}

impl ClientConfig {
    /// Configuration for a static API key against the default endpoint.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            api_endpoint: default_api_endpoint(),
            timeout_secs: default_timeout_secs(),
            user_agent_suffix: None,
            auth: AuthConfig::Token { token: token.into() },
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_endpoint", &self.api_endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent_suffix", &self.user_agent_suffix)
            .field("auth", &self.auth)
            .finish()
    }
}

/// Which credential the client attaches to outbound requests
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthConfig {
    /// Static account or user API key
    Token { token: String },

    /// OAuth2 client-credentials grant
    #[serde(rename = "oauth")]
    OAuth {
        client_id: String,
        client_secret: String,
        scopes: Vec<String>,
        #[serde(default)]
        scope_style: ScopeStyle,
        #[serde(default = "default_token_endpoint")]
        token_endpoint: String,
        /// Where to persist the token between process runs
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_file: Option<PathBuf>,
    },
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token { .. } => f.debug_struct("Token").field("token", &"<redacted>").finish(),
            Self::OAuth { client_id, scopes, scope_style, token_endpoint, token_file, .. } => f
                .debug_struct("OAuth")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .field("scopes", scopes)
                .field("scope_style", scope_style)
                .field("token_endpoint", token_endpoint)
                .field("token_file", token_file)
                .finish(),
        }
    }
}

/// Scope grammar an OAuth application was registered with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeStyle {
    /// `read` or `write`
    Classic,
    /// `resource.permission`, `openid` and `as_account-*` tokens
    #[default]
    Scoped,
}

fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_token_endpoint() -> String {
    DEFAULT_TOKEN_ENDPOINT.to_string()
}
