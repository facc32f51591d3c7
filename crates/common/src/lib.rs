//! Pure building blocks shared across Pagerline crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: API error classification, OAuth scope grammars
//! - `observability`: tracing events (not included by default)
//! - `webhook`: inbound webhook signature verification

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod auth;
#[cfg(feature = "foundation")]
pub mod error;

// Webhook tier
// --------------------------------------------------------------------
#[cfg(feature = "webhook")]
pub mod webhook;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use auth::{
    normalize_scopes, validate_classic_scopes, validate_scoped_oauth_scopes, ScopeGrammar,
    ScopeValidationError,
};
#[cfg(feature = "foundation")]
pub use error::{classify, ApiError, ApiErrorKind, ErrorClassification, ErrorSeverity};
#[cfg(feature = "webhook")]
pub use webhook::{sign_payload, verify_signature, SignatureError, SignatureSet, WebhookVerifier};
