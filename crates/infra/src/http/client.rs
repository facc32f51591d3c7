use std::time::Duration;

use pagerline_domain::constants::DEFAULT_TIMEOUT_SECS;
use pagerline_domain::PagerlineError;
use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

/// Shared HTTP transport.
///
/// Cloning is cheap and clones share one connection pool, so a single
/// instance serves every concurrent caller. Each `send` is exactly one
/// network attempt; callers own any retry policy.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, PagerlineError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Build and execute the request once.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, reqwest::Error> {
        self.execute(builder.build()?).await
    }

    /// Execute an already built request once.
    ///
    /// The raw transport error is returned so callers can tell timeouts
    /// apart from other failures; [`InfraError`] maps it into the domain.
    pub async fn execute(&self, request: Request) -> Result<Response, reqwest::Error> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        let result = self.client.execute(request).await;
        match &result {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "received HTTP response");
            }
            Err(err) => debug!(%method, %url, error = %err, "HTTP request failed"),
        }
        result
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    system_proxy: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
            system_proxy: false,
        }
    }
}

impl HttpClientBuilder {
    /// Whole-request timeout, connect through body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `User-Agent` sent with every request.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Honor `HTTP_PROXY`/`HTTPS_PROXY` from the environment (off by default).
    pub fn system_proxy(mut self, enabled: bool) -> Self {
        self.system_proxy = enabled;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// [`PagerlineError::Config`] when the TLS backend cannot be initialised.
    pub fn build(self) -> Result<HttpClient, PagerlineError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout);

        if !self.system_proxy {
            builder = builder.no_proxy();
        }

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| PagerlineError::from(InfraError::from(err)))?;

        Ok(HttpClient { client })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::StatusCode;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn local_client() -> HttpClient {
        HttpClient::new().expect("http client")
    }

    #[tokio::test]
    async fn server_errors_are_returned_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = local_client();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn sends_configured_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "pagerline/test"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::builder().user_agent("pagerline/test").build().unwrap();
        let response = client.send(client.request(Method::GET, server.uri())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn connection_failure_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = local_client();
        let result = client.send(client.request(Method::GET, format!("http://{addr}"))).await;
        match result.map_err(|err| PagerlineError::from(InfraError::from(err))) {
            Err(PagerlineError::Network(msg)) => {
                assert!(msg.to_lowercase().contains("http"));
            }
            other => panic!("expected network error, got {other:?}"),
        }
    }
}
