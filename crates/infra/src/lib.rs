//! # Pagerline Infrastructure
//!
//! I/O side of the client: HTTP transport, request dispatch, token sources,
//! pagination and configuration loading.
//!
//! ## Architecture
//! - Data types and configuration live in `pagerline-domain`
//! - Error classification, scope grammars and webhook verification live in
//!   `pagerline-common` and are re-exported here

pub mod api;
pub mod config;
pub mod errors;
pub mod http;

pub use api::{
    ApiClient, ApiClientBuilder, ApiRequest, ApiResponse, ClientError, RequestContext,
    TokenSource,
};
pub use http::{HttpClient, HttpClientBuilder};
pub use pagerline_common::webhook;
pub use pagerline_common::{classify, ApiError, ApiErrorKind, ErrorClassification};
