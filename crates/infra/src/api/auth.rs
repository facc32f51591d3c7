//! Credential sources consulted before every dispatch

use async_trait::async_trait;
use pagerline_domain::Credential;

use super::errors::ClientError;

/// Produces a valid credential on demand
///
/// Implementations must be safe to call from many tasks at once.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a credential that is valid right now, refreshing if needed.
    async fn token(&self) -> Result<Credential, ClientError>;
}

/// Account or user API key; never expires
#[derive(Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    /// Wrap an account or user API key.
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl std::fmt::Debug for StaticTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenSource").field("token", &"<redacted>").finish()
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn token(&self) -> Result<Credential, ClientError> {
        Ok(Credential::Static(self.token.clone()))
    }
}
