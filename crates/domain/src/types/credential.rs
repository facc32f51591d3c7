//! Credentials attached to outbound requests
//!
//! A [`Credential`] is either a static API key that never expires or an
//! OAuth2 bearer token with a well-defined expiry instant. The on-disk
//! [`PersistedToken`] additionally records which client and scope set the
//! token was issued for, so a cached token is never reused for a different
//! request.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Authentication artifact rendered into the `Authorization` header
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Account or user API key
    Static(String),
    /// OAuth2 access token
    OAuth(OAuthToken),
}

impl Credential {
    /// Render the `Authorization` header value for this credential kind.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        match self {
            Self::Static(key) => format!("Token token={key}"),
            Self::OAuth(token) => format!("Bearer {}", token.access_token),
        }
    }

    /// Static keys never expire; OAuth tokens expire `threshold_seconds`
    /// before their recorded expiry.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        match self {
            Self::Static(_) => false,
            Self::OAuth(token) => token.is_expired_at(Utc::now(), threshold_seconds),
        }
    }

    /// Short label for logs; never includes the secret itself.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Static(_) => "static",
            Self::OAuth(_) => "oauth2",
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(_) => f.write_str("Credential::Static(<redacted>)"),
            Self::OAuth(token) => f.debug_tuple("Credential::OAuth").field(token).finish(),
        }
    }
}

/// OAuth2 bearer token issued by the token endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,

    /// Usually `bearer`; kept verbatim from the token response
    pub token_type: String,

    /// Absolute expiry (UTC). `None` means the server did not report a
    /// lifetime and the token is treated as non-expiring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl OAuthToken {
    /// Create a token whose expiry is computed from `expires_in` seconds.
    ///
    /// A lifetime too large to represent as an instant is treated as
    /// non-expiring.
    #[must_use]
    pub fn new(access_token: String, token_type: String, expires_in: Option<i64>) -> Self {
        let expiry = expires_in
            .filter(|secs| *secs > 0)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));

        Self { access_token, token_type, expiry }
    }

    /// Check whether the token is expired, or will be within
    /// `threshold_seconds`, at instant `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, threshold_seconds: i64) -> bool {
        match self.expiry {
            // A threshold reaching past the representable range covers any expiry.
            Some(expiry) => Duration::try_seconds(threshold_seconds)
                .and_then(|threshold| now.checked_add_signed(threshold))
                .map_or(true, |horizon| horizon >= expiry),
            None => false,
        }
    }

    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expiry.map(|expiry| (expiry - Utc::now()).num_seconds())
    }
}

impl fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// On-disk form of an OAuth token plus the request it was issued for
///
/// The file is replaced wholesale on every refresh. A loaded value is only
/// usable when it has not expired and both the client ID and the scope set
/// (order-insensitive) match the caller's current request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    pub client_id: String,
    /// Space-joined scope list
    pub scopes: String,
}

impl PersistedToken {
    #[must_use]
    pub fn new(token: &OAuthToken, client_id: &str, scopes: &str) -> Self {
        Self {
            access_token: token.access_token.clone(),
            token_type: token.token_type.clone(),
            expiry: token.expiry,
            client_id: client_id.to_string(),
            scopes: scopes.to_string(),
        }
    }

    /// Whether this cached token may serve a request for `client_id` with
    /// `scopes` at instant `now`.
    #[must_use]
    pub fn is_usable_for(
        &self,
        client_id: &str,
        scopes: &str,
        now: DateTime<Utc>,
        threshold_seconds: i64,
    ) -> bool {
        self.client_id == client_id
            && scope_set(&self.scopes) == scope_set(scopes)
            && !self.token().is_expired_at(now, threshold_seconds)
    }

    #[must_use]
    pub fn token(&self) -> OAuthToken {
        OAuthToken {
            access_token: self.access_token.clone(),
            token_type: self.token_type.clone(),
            expiry: self.expiry,
        }
    }
}

impl fmt::Debug for PersistedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expiry", &self.expiry)
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .finish()
    }
}

fn scope_set(scopes: &str) -> BTreeSet<&str> {
    scopes.split_whitespace().collect()
}
