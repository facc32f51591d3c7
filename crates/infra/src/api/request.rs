//! Request/response values exchanged with the dispatcher

use std::future::Future;
use std::time::Duration;

use pagerline_domain::constants::QUERY_OFFSET;
use pagerline_domain::ListOptions;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::errors::ClientError;

/// Cancellation and deadline applied to one outbound operation
///
/// Covers the credential fetch as well as the network round trip, so a
/// caller-imposed limit unblocks the call promptly instead of waiting for
/// the socket timeout.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancellation: Option<CancellationToken>,
    deadline: Option<Instant>,
    budget: Option<Duration>,
}

impl RequestContext {
    /// No cancellation and no deadline beyond the transport timeout.
    pub fn background() -> Self {
        Self::default()
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout(timeout)
    }

    /// Context cancelled through `token`, with no deadline of its own.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self::background().cancellation(token)
    }

    /// Replace the deadline with `timeout` from now.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self.budget = Some(timeout);
        self
    }

    /// Attach a cancellation token.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Whether the caller has cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Instant after which the request fails with a timeout.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drive `operation` until it completes, the token is cancelled or the
    /// deadline passes, whichever comes first.
    pub async fn run<F, T>(&self, operation: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let cancelled = async {
            match &self.cancellation {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = cancelled => Err(ClientError::Cancelled),
            () = expired => Err(ClientError::Timeout(self.budget.unwrap_or_default())),
            result = operation => result,
        }
    }
}

/// One outbound call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) headers: HeaderMap,
    pub(crate) expected_status: Option<StatusCode>,
}

impl ApiRequest {
    /// Request for `method` on `path`, relative to the base endpoint.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
            expected_status: None,
        }
    }

    /// `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT` request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    /// [`ClientError::Config`] if `body` cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        let encoded = serde_json::to_vec(body)
            .map_err(|err| ClientError::Config(format!("failed to encode request body: {err}")))?;
        self.body = Some(encoded);
        Ok(self)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Replace every existing value of `key`.
    pub fn set_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.retain(|(existing, _)| existing != key);
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Render `limit`, `offset` and `total` as query parameters.
    pub fn list_options(mut self, options: &ListOptions) -> Self {
        for (key, value) in options.query_pairs() {
            self = self.set_query(&key, value);
        }
        self
    }

    /// Extra header merged after the fixed ones (early-access flags and the
    /// like). Repeating a name appends another value.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Append every header in `headers`.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in &headers {
            self.headers.append(name.clone(), value.clone());
        }
        self
    }

    /// Accept only `status` as success instead of any 2xx.
    pub fn expect_status(mut self, status: StatusCode) -> Self {
        self.expected_status = Some(status);
        self
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the base endpoint.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub(crate) fn offset(&self) -> Option<u32> {
        self.query
            .iter()
            .rev()
            .find(|(key, _)| key == QUERY_OFFSET)
            .and_then(|(_, value)| value.parse().ok())
    }

    pub(crate) fn accepts(&self, status: StatusCode) -> bool {
        match self.expected_status {
            Some(expected) => status == expected,
            None => status.is_success(),
        }
    }
}

/// Successful response with its body fully buffered
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self { status, headers, body }
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body.
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Take the raw body.
    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    /// Body as UTF-8, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body. An empty body (204/205) decodes as JSON `null`, so
    /// `()` and `Option<T>` targets succeed.
    ///
    /// # Errors
    /// [`ClientError::Decode`] when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                ClientError::Decode(format!(
                    "empty response ({}) cannot be decoded into the requested type",
                    self.status.as_u16()
                ))
            });
        }
        serde_json::from_slice(&self.body).map_err(|err| ClientError::Decode(err.to_string()))
    }
}
