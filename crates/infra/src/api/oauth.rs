//! OAuth2 client-credentials token source
//!
//! [`ClientCredentialsExchange`] performs the grant against the token
//! endpoint. [`OAuthTokenSource`] wraps any [`TokenExchange`] with an
//! in-memory token, an optional file cache and single-flight refresh: when
//! many tasks find the held token unusable at once, exactly one exchange is
//! issued and every waiter receives its outcome.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use pagerline_common::{normalize_scopes, validate_classic_scopes, validate_scoped_oauth_scopes};
use pagerline_domain::constants::{DEFAULT_TOKEN_ENDPOINT, DEFAULT_TOKEN_REFRESH_THRESHOLD_SECS};
use pagerline_domain::{Credential, OAuthToken, PersistedToken, ScopeStyle};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, info, warn};

use super::auth::TokenSource;
use super::errors::ClientError;
use super::token_cache::TokenFileCache;
use crate::http::HttpClient;

/// Client-credentials grant parameters, scopes validated up front
#[derive(Clone)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: String,
    scopes: Vec<String>,
    token_url: String,
}

impl ClientCredentials {
    /// Validate `scopes` against `style` before any network call is made.
    ///
    /// # Errors
    /// [`ClientError::ScopeValidation`] naming the offending scope.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scopes: Vec<String>,
        style: ScopeStyle,
    ) -> Result<Self, ClientError> {
        match style {
            ScopeStyle::Classic => validate_classic_scopes(&scopes)?,
            ScopeStyle::Scoped => validate_scoped_oauth_scopes(&scopes)?,
        }

        Ok(Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes,
            token_url: DEFAULT_TOKEN_ENDPOINT.to_string(),
        })
    }

    /// Override the token endpoint.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// OAuth client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Scopes as supplied, in caller order.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Sorted, de-duplicated, space-joined scopes.
    pub fn normalized_scopes(&self) -> String {
        normalize_scopes(&self.scopes)
    }

    /// Token endpoint the grant is posted to.
    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Base operation that obtains a fresh token from the authorization server
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self) -> Result<OAuthToken, ClientError>;

    /// Client the tokens are issued to.
    fn client_id(&self) -> &str;

    /// Normalized scope string the tokens are issued for.
    fn scopes(&self) -> String;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// RFC 6749 §5.2 error body
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl fmt::Display for OAuthErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{}: {description}", self.error),
            None => f.write_str(&self.error),
        }
    }
}

/// Client-credentials grant over HTTP
#[derive(Debug, Clone)]
pub struct ClientCredentialsExchange {
    http: HttpClient,
    credentials: ClientCredentials,
    timeout: Duration,
}

impl ClientCredentialsExchange {
    /// Exchange over `http`, bounded by `timeout` per attempt.
    pub fn new(http: HttpClient, credentials: ClientCredentials, timeout: Duration) -> Self {
        Self { http, credentials, timeout }
    }

    /// Grant parameters used for every exchange.
    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }
}

#[async_trait]
impl TokenExchange for ClientCredentialsExchange {
    async fn exchange(&self) -> Result<OAuthToken, ClientError> {
        let params = [
            ("grant_type", "client_credentials".to_string()),
            ("client_id", self.credentials.client_id.clone()),
            ("client_secret", self.credentials.client_secret.clone()),
            ("scope", self.credentials.scopes.join(" ")),
        ];

        debug!(client_id = %self.credentials.client_id, "requesting OAuth token");
        let request =
            self.http.request(reqwest::Method::POST, &self.credentials.token_url).form(&params);
        let response = self
            .http
            .send(request)
            .await
            .map_err(|err| ClientError::from_transport(&err, self.timeout))?;

        let status = response.status();
        let body =
            response.bytes().await.map_err(|err| ClientError::from_transport(&err, self.timeout))?;

        if !status.is_success() {
            let message = match serde_json::from_slice::<OAuthErrorBody>(&body) {
                Ok(error) => format!("{error} (status {})", status.as_u16()),
                Err(_) => format!("token endpoint returned status {}", status.as_u16()),
            };
            warn!(status = status.as_u16(), "OAuth token exchange rejected");
            return Err(ClientError::TokenExchange(message));
        }

        let token: TokenResponse = serde_json::from_slice(&body).map_err(|err| {
            ClientError::TokenExchange(format!("malformed token response: {err}"))
        })?;

        info!(expires_in = ?token.expires_in, "obtained OAuth token");
        Ok(OAuthToken::new(token.access_token, token.token_type, token.expires_in))
    }

    fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    fn scopes(&self) -> String {
        self.credentials.normalized_scopes()
    }
}

#[derive(Default)]
struct RefreshState {
    token: Option<OAuthToken>,
    /// Failure of the most recent exchange, tagged with its completion number
    failure: Option<(u64, ClientError)>,
}

/// Reuse wrapper around a [`TokenExchange`]
pub struct OAuthTokenSource<E> {
    exchange: E,
    client_id: String,
    scopes: String,
    state: Mutex<RefreshState>,
    /// Exchanges completed so far; bumped only while `state` is held
    completed: AtomicU64,
    cache: Option<TokenFileCache>,
    refresh_threshold_secs: i64,
}

impl<E: TokenExchange> OAuthTokenSource<E> {
    /// Wrap `exchange` with an in-memory token and no file cache.
    pub fn new(exchange: E) -> Self {
        let client_id = exchange.client_id().to_string();
        let scopes = exchange.scopes();
        Self {
            exchange,
            client_id,
            scopes,
            state: Mutex::new(RefreshState::default()),
            completed: AtomicU64::new(0),
            cache: None,
            refresh_threshold_secs: DEFAULT_TOKEN_REFRESH_THRESHOLD_SECS,
        }
    }

    /// Treat tokens expiring within `seconds` as already expired.
    pub fn with_refresh_threshold(mut self, seconds: i64) -> Self {
        self.refresh_threshold_secs = seconds;
        let state = self.state.get_mut();
        if state.token.as_ref().is_some_and(|token| token.is_expired_at(Utc::now(), seconds)) {
            state.token = None;
        }
        self
    }

    /// Persist tokens to `path` and seed the in-memory token from it.
    ///
    /// A cached token issued for another client or scope set, or already
    /// expired, is discarded.
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        let cache = TokenFileCache::new(path);
        let loaded = cache.load().filter(|persisted| {
            let usable = persisted.is_usable_for(
                &self.client_id,
                &self.scopes,
                Utc::now(),
                self.refresh_threshold_secs,
            );
            if !usable {
                debug!(path = %cache.path().display(), "discarding unusable cached OAuth token");
            }
            usable
        });

        if let Some(persisted) = loaded {
            debug!(path = %cache.path().display(), "reusing cached OAuth token");
            self.state.get_mut().token = Some(persisted.token());
        }
        self.cache = Some(cache);
        self
    }

    /// Number of base exchanges completed so far.
    pub fn exchange_count(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// The wrapped base exchange.
    pub fn exchange(&self) -> &E {
        &self.exchange
    }

    fn usable(&self, token: Option<&OAuthToken>) -> Option<OAuthToken> {
        token.filter(|token| !token.is_expired_at(Utc::now(), self.refresh_threshold_secs)).cloned()
    }

    /// Write the fresh token to the file cache off the async runtime.
    async fn persist(&self, token: &OAuthToken) {
        let Some(cache) = self.cache.clone() else {
            return;
        };
        let persisted = PersistedToken::new(token, &self.client_id, &self.scopes);
        let path = cache.path().to_path_buf();

        match task::spawn_blocking(move || cache.store(&persisted)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(path = %path.display(), error = %err, "failed to persist OAuth token");
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "OAuth token persistence task failed");
            }
        }
    }

    /// Drop the cached token after the authorization server rejected the
    /// client, so later processes do not start from it.
    async fn discard_cached(&self) {
        let Some(cache) = self.cache.clone() else {
            return;
        };
        let path = cache.path().to_path_buf();

        match task::spawn_blocking(move || cache.clear()).await {
            Ok(Ok(())) => debug!(path = %path.display(), "cleared cached OAuth token"),
            Ok(Err(err)) => {
                warn!(path = %path.display(), error = %err, "failed to clear OAuth token cache");
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "OAuth token cache task failed");
            }
        }
    }
}

#[async_trait]
impl<E: TokenExchange> TokenSource for OAuthTokenSource<E> {
    async fn token(&self) -> Result<Credential, ClientError> {
        let observed = self.completed.load(Ordering::Acquire);
        let mut state = self.state.lock().await;

        if let Some(token) = self.usable(state.token.as_ref()) {
            return Ok(Credential::OAuth(token));
        }

        // An exchange finished while this caller was waiting for the lock:
        // share its failure instead of issuing another one.
        if let Some((completion, err)) = &state.failure {
            if *completion > observed {
                return Err(err.clone());
            }
        }

        debug!(client_id = %self.client_id, "refreshing OAuth token");
        let result = self.exchange.exchange().await;
        let completion = self.completed.fetch_add(1, Ordering::AcqRel) + 1;

        match result {
            Ok(token) => {
                self.persist(&token).await;
                state.failure = None;
                state.token = Some(token.clone());
                Ok(Credential::OAuth(token))
            }
            Err(err) => {
                if matches!(err, ClientError::TokenExchange(_)) {
                    self.discard_cached().await;
                }
                state.failure = Some((completion, err.clone()));
                Err(err)
            }
        }
    }
}

impl<E> fmt::Debug for OAuthTokenSource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokenSource")
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("cache", &self.cache)
            .field("refresh_threshold_secs", &self.refresh_threshold_secs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration as ChronoDuration;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn credentials(server: &MockServer) -> ClientCredentials {
        ClientCredentials::new("client-a", "s3cret", vec!["incidents.read".into()], ScopeStyle::Scoped)
            .unwrap()
            .with_token_url(format!("{}/oauth/token", server.uri()))
    }

    fn exchange_for(server: &MockServer) -> ClientCredentialsExchange {
        let http = HttpClient::new().unwrap();
        ClientCredentialsExchange::new(http, credentials(server), Duration::from_secs(5))
    }

    #[test]
    fn scopes_are_validated_before_any_request() {
        let err = ClientCredentials::new("c", "s", vec!["read".into()], ScopeStyle::Scoped)
            .unwrap_err();
        assert!(matches!(&err, ClientError::ScopeValidation(e) if e.scope() == Some("read")));

        let err = ClientCredentials::new("c", "s", vec!["incidents.read".into()], ScopeStyle::Classic)
            .unwrap_err();
        assert!(err.to_string().contains("incidents.read"));
    }

    #[test]
    fn debug_hides_client_secret() {
        let creds =
            ClientCredentials::new("c", "very-secret", vec!["write".into()], ScopeStyle::Classic)
                .unwrap();
        assert!(!format!("{creds:?}").contains("very-secret"));
    }

    #[tokio::test]
    async fn exchange_posts_client_credentials_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client-a"))
            .and(body_string_contains("scope=incidents.read"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-1",
                "token_type": "bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = exchange_for(&server).exchange().await.unwrap();

        assert_eq!(token.access_token, "at-1");
        let remaining = token.seconds_until_expiry().unwrap();
        assert!(remaining > 3500 && remaining <= 3600);
    }

    #[tokio::test]
    async fn oauth_error_body_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "unknown client"
            })))
            .mount(&server)
            .await;

        let err = exchange_for(&server).exchange().await.unwrap_err();
        match err {
            ClientError::TokenExchange(message) => {
                assert!(message.contains("invalid_client"));
                assert!(message.contains("unknown client"));
            }
            other => panic!("expected token exchange error, got {other:?}"),
        }
    }

    struct FailingExchange {
        calls: Arc<AtomicU64>,
    }

    #[async_trait]
    impl TokenExchange for FailingExchange {
        async fn exchange(&self) -> Result<OAuthToken, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err(ClientError::TokenExchange("invalid_client".into()))
        }

        fn client_id(&self) -> &str {
            "client-a"
        }

        fn scopes(&self) -> String {
            "incidents.read".into()
        }
    }

    #[tokio::test]
    async fn concurrent_waiters_share_a_failed_exchange() {
        let calls = Arc::new(AtomicU64::new(0));
        let source = Arc::new(OAuthTokenSource::new(FailingExchange { calls: calls.clone() }));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let source = source.clone();
                tokio::spawn(async move { source.token().await })
            })
            .collect();

        for handle in handles {
            assert!(matches!(handle.await.unwrap(), Err(ClientError::TokenExchange(_))));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // a later call is not served the stale failure
        assert!(source.token().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn refresh_threshold_drops_tokens_about_to_expire() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let token = OAuthToken {
            access_token: "at-0".into(),
            token_type: "bearer".into(),
            expiry: Some(Utc::now() + ChronoDuration::seconds(60)),
        };
        TokenFileCache::new(&path)
            .store(&PersistedToken::new(&token, "client-a", "incidents.read"))
            .unwrap();

        let calls = Arc::new(AtomicU64::new(0));
        let source = OAuthTokenSource::new(FailingExchange { calls })
            .with_token_file(&path)
            .with_refresh_threshold(120);

        assert!(source.usable(source.state.try_lock().unwrap().token.as_ref()).is_none());
    }

    #[tokio::test]
    async fn oversized_lifetime_does_not_abort_the_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-forever",
                "token_type": "bearer",
                "expires_in": 9_000_000_000_000_000_i64
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = Arc::new(OAuthTokenSource::new(exchange_for(&server)));
        let spawned = source.clone();
        let joined = tokio::spawn(async move { spawned.token().await }).await;

        let credential = joined.expect("token task must not panic").unwrap();
        assert_eq!(credential.authorization_header(), "Bearer at-forever");

        source.token().await.unwrap();
        assert_eq!(source.exchange_count(), 1);
    }

    #[tokio::test]
    async fn persisted_token_is_written_from_async_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-2",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");

        let source = OAuthTokenSource::new(exchange_for(&server)).with_token_file(&path);
        source.token().await.unwrap();

        let stored = TokenFileCache::new(&path).load().unwrap();
        assert_eq!(stored.access_token, "at-2");
        assert_eq!(stored.client_id, "client-a");
    }

    #[tokio::test]
    async fn rejected_exchange_clears_stale_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let expired = OAuthToken {
            access_token: "at-old".into(),
            token_type: "bearer".into(),
            expiry: Some(Utc::now() - ChronoDuration::seconds(60)),
        };
        TokenFileCache::new(&path)
            .store(&PersistedToken::new(&expired, "client-a", "incidents.read"))
            .unwrap();

        let calls = Arc::new(AtomicU64::new(0));
        let source = OAuthTokenSource::new(FailingExchange { calls }).with_token_file(&path);

        assert!(matches!(source.token().await, Err(ClientError::TokenExchange(_))));
        assert!(!path.exists());
    }
}
