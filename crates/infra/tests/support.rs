#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use pagerline_domain::OAuthToken;
use pagerline_infra::api::{ApiClient, ClientError, DebugFlags, TokenExchange};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use wiremock::MockServer;

pub const TEST_TOKEN: &str = "test-token";
pub const CLIENT_ID: &str = "client-a";
pub const SCOPES: &str = "incidents.read users.read";

/// Route client events to the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Client with a static key pointed at the mock server, capture enabled.
pub fn client_for(server: &MockServer) -> ApiClient {
    init_tracing();
    ApiClient::builder()
        .api_endpoint(server.uri())
        .token(TEST_TOKEN)
        .debug_flags(DebugFlags::ALL)
        .build()
        .expect("api client should build")
}

/// One list page with `count` teams starting at `first`.
pub fn teams_page(first: usize, count: usize, offset: u32, limit: u32, more: bool) -> Value {
    let teams: Vec<Value> = (first..first + count)
        .map(|n| json!({"id": format!("T{n}"), "type": "team", "summary": format!("Team {n}")}))
        .collect();
    json!({"teams": teams, "offset": offset, "limit": limit, "more": more, "total": 0})
}

/// Fake base exchange that counts calls and returns a fresh token
pub struct CountingExchange {
    calls: Arc<AtomicUsize>,
    delay: Duration,
    expires_in: i64,
}

impl CountingExchange {
    pub fn new(delay: Duration) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { calls: calls.clone(), delay, expires_in: 3600 }, calls)
    }

    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.expires_in = seconds;
        self
    }
}

#[async_trait]
impl TokenExchange for CountingExchange {
    async fn exchange(&self) -> Result<OAuthToken, ClientError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        Ok(OAuthToken::new(format!("fresh-{call}"), "bearer".into(), Some(self.expires_in)))
    }

    fn client_id(&self) -> &str {
        CLIENT_ID
    }

    fn scopes(&self) -> String {
        SCOPES.to_string()
    }
}

pub fn token_expiring_in(access_token: &str, seconds: i64) -> OAuthToken {
    OAuthToken {
        access_token: access_token.to_string(),
        token_type: "bearer".to_string(),
        expiry: Some(Utc::now() + chrono::Duration::seconds(seconds)),
    }
}
