//! Authenticated request dispatcher
//!
//! Every outbound call takes the same path: fetch a credential, resolve the
//! path against the base endpoint, attach the fixed headers, merge caller
//! headers, send once, then classify any non-success status. No retries.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pagerline_common::classify;
use pagerline_domain::constants::{
    ACCEPT_HEADER, CONTENT_TYPE_JSON, DEFAULT_API_ENDPOINT, DEFAULT_TIMEOUT_SECS,
    USER_AGENT_PRODUCT, VERSION,
};
use pagerline_domain::{AuthConfig, ClientConfig};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;

use super::auth::{StaticTokenSource, TokenSource};
use super::debug::{CapturedRequest, CapturedResponse, DebugCapture, DebugFlags};
use super::errors::ClientError;
use super::oauth::{ClientCredentials, ClientCredentialsExchange, OAuthTokenSource};
use super::request::{ApiRequest, ApiResponse, RequestContext};
use crate::http::HttpClient;

/// Client for the incident-management REST API
///
/// Cheap to share behind an `Arc`; one instance serves concurrent callers.
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    timeout: Duration,
    token_source: Arc<dyn TokenSource>,
    debug: DebugCapture,
}

impl ApiClient {
    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Build a fully wired client from configuration.
    ///
    /// # Errors
    /// [`ClientError::ScopeValidation`] when configured OAuth scopes do not
    /// match their grammar, [`ClientError::Config`] when the transport cannot
    /// be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut builder = Self::builder().api_endpoint(&config.api_endpoint).timeout(timeout);
        if let Some(suffix) = &config.user_agent_suffix {
            builder = builder.user_agent_suffix(suffix);
        }

        match &config.auth {
            AuthConfig::Token { token } => builder.token(token).build(),
            AuthConfig::OAuth {
                client_id,
                client_secret,
                scopes,
                scope_style,
                token_endpoint,
                token_file,
            } => {
                let credentials = ClientCredentials::new(
                    client_id,
                    client_secret,
                    scopes.clone(),
                    *scope_style,
                )?
                .with_token_url(token_endpoint);
                let http = HttpClient::builder()
                    .timeout(timeout)
                    .user_agent(user_agent(config.user_agent_suffix.as_deref()))
                    .build()?;

                let mut source = OAuthTokenSource::new(ClientCredentialsExchange::new(
                    http,
                    credentials,
                    timeout,
                ));
                if let Some(path) = token_file {
                    source = source.with_token_file(path);
                }
                builder.token_source(Arc::new(source)).build()
            }
        }
    }

    /// Base endpoint every request path is resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one authenticated request.
    ///
    /// Succeeds when the status is 2xx, or equals the request's expected
    /// status when one is set; the response body is fully buffered.
    ///
    /// # Errors
    /// [`ClientError::Api`] for a failure status, [`ClientError::Cancelled`]
    /// or [`ClientError::Timeout`] when `ctx` ends first, and transport or
    /// credential errors otherwise.
    #[instrument(skip(self, ctx, request), fields(method = %request.method, path = %request.path))]
    pub async fn dispatch(
        &self,
        ctx: &RequestContext,
        request: ApiRequest,
    ) -> Result<ApiResponse, ClientError> {
        ctx.run(self.dispatch_once(request)).await
    }

    async fn dispatch_once(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let credential = self.token_source.token().await?;
        let url = self.resolve(&request.path, &request.query)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
        if request.body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        }
        let mut authorization = HeaderValue::from_str(&credential.authorization_header())
            .map_err(|_| {
                ClientError::Config("credential contains characters invalid in a header".into())
            })?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        merge_headers(&mut headers, request.headers.clone());

        self.debug.record_request(&request.method, &url, &headers, request.body.as_deref());
        debug!(credential = credential.kind(), %url, "dispatching request");

        let mut builder = self.http.request(request.method.clone(), url).headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = self
            .http
            .send(builder)
            .await
            .map_err(|err| ClientError::from_transport(&err, self.timeout))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|err| ClientError::from_transport(&err, self.timeout))?
            .to_vec();
        self.debug.record_response(status.as_u16(), &headers, &body);

        if !request.accepts(status) {
            let error = classify(status.as_u16(), &body).with_retry_after(retry_after(&headers));
            if error.is_temporary() {
                warn!(status = status.as_u16(), error = %error, "request failed");
            } else {
                debug!(status = status.as_u16(), error = %error, "request failed");
            }
            return Err(ClientError::Api(error));
        }

        Ok(ApiResponse::new(status, headers, body))
    }

    /// GET `path` and decode the JSON payload.
    ///
    /// # Errors
    /// See [`ApiClient::dispatch`]; [`ClientError::Decode`] when the payload
    /// does not match `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
    ) -> Result<T, ClientError> {
        self.dispatch(ctx, ApiRequest::get(path)).await?.json()
    }

    /// POST `body` as JSON to `path` and decode the JSON payload.
    ///
    /// # Errors
    /// See [`ApiClient::get_json`].
    pub async fn post_json<B, T>(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.dispatch(ctx, ApiRequest::post(path).json(body)?).await?.json()
    }

    /// PUT `body` as JSON to `path` and decode the JSON payload.
    ///
    /// # Errors
    /// See [`ApiClient::get_json`].
    pub async fn put_json<B, T>(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.dispatch(ctx, ApiRequest::put(path).json(body)?).await?.json()
    }

    /// DELETE `path`, discarding any payload.
    ///
    /// # Errors
    /// See [`ApiClient::dispatch`].
    pub async fn delete(&self, ctx: &RequestContext, path: &str) -> Result<(), ClientError> {
        self.dispatch(ctx, ApiRequest::delete(path)).await.map(drop)
    }

    /// Last request sent, when request capture is enabled.
    pub fn last_request(&self) -> Option<CapturedRequest> {
        self.debug.last_request()
    }

    /// Last response received, when response capture is enabled.
    pub fn last_response(&self) -> Option<CapturedResponse> {
        self.debug.last_response()
    }

    fn resolve(&self, path: &str, query: &[(String, String)]) -> Result<Url, ClientError> {
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url = Url::parse(&joined)
            .map_err(|err| ClientError::Config(format!("invalid request URL {joined}: {err}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Caller headers replace fixed headers of the same name; repeated caller
/// values for one name are all kept.
fn merge_headers(target: &mut HeaderMap, extra: HeaderMap) {
    let mut current: Option<HeaderName> = None;
    for (name, value) in extra {
        match name {
            Some(name) => {
                target.insert(name.clone(), value);
                current = Some(name);
            }
            None => {
                if let Some(name) = &current {
                    target.append(name.clone(), value);
                }
            }
        }
    }
}

/// `Retry-After` as delay-seconds or an HTTP date.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - Utc::now()).to_std().unwrap_or(Duration::ZERO))
}

fn user_agent(suffix: Option<&str>) -> String {
    match suffix.map(str::trim).filter(|suffix| !suffix.is_empty()) {
        Some(suffix) => format!("{USER_AGENT_PRODUCT}/{VERSION} {suffix}"),
        None => format!("{USER_AGENT_PRODUCT}/{VERSION}"),
    }
}

/// Builder for [`ApiClient`]
pub struct ApiClientBuilder {
    api_endpoint: String,
    token_source: Option<Arc<dyn TokenSource>>,
    timeout: Duration,
    user_agent_suffix: Option<String>,
    debug_flags: DebugFlags,
    system_proxy: bool,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            token_source: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent_suffix: None,
            debug_flags: DebugFlags::NONE,
            system_proxy: false,
        }
    }
}

impl ApiClientBuilder {
    /// Override the base endpoint (test doubles, regional endpoints).
    pub fn api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into();
        self
    }

    /// Authenticate with a static API key.
    pub fn token(self, token: impl Into<String>) -> Self {
        self.token_source(Arc::new(StaticTokenSource::new(token)))
    }

    /// Use a custom credential provider.
    pub fn token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Default deadline for each request, token fetch included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Text appended after `pagerline/<version>` in the User-Agent.
    pub fn user_agent_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.user_agent_suffix = Some(suffix.into());
        self
    }

    /// Enable capture of the last request and response.
    pub fn debug_flags(mut self, flags: DebugFlags) -> Self {
        self.debug_flags = flags;
        self
    }

    /// Honor proxy settings from the environment.
    pub fn system_proxy(mut self, enabled: bool) -> Self {
        self.system_proxy = enabled;
        self
    }

    /// # Errors
    /// [`ClientError::Config`] if no credential source was set or the
    /// transport cannot be built.
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let token_source = self
            .token_source
            .ok_or_else(|| ClientError::Config("token source not set".to_string()))?;

        let base_url = self.api_endpoint.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|err| {
            ClientError::Config(format!("invalid API endpoint {base_url}: {err}"))
        })?;

        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(user_agent(self.user_agent_suffix.as_deref()))
            .system_proxy(self.system_proxy)
            .build()?;

        Ok(ApiClient {
            http,
            base_url,
            timeout: self.timeout,
            token_source,
            debug: DebugCapture::new(self.debug_flags),
        })
    }
}
