//! Inbound webhook signature verification
//!
//! Deliveries carry an `X-Pagerline-Signature` header holding one or more
//! comma-separated `version=hexDigest` pairs. During a secret rotation the
//! sender signs with every active secret, so verification succeeds when any
//! `v1` digest matches HMAC-SHA256 over the raw body.
//!
//! The three failure kinds stay distinguishable so an HTTP handler can
//! answer correctly:
//!
//! | Error | Suggested response |
//! |-------|--------------------|
//! | [`SignatureError::MalformedHeader`] | 400, the request shape is broken |
//! | [`SignatureError::MalformedBody`] | 400, the request shape is broken |
//! | [`SignatureError::NoValidSignature`] | 401/403, the sender's secret is wrong |
//!
//! ```rust
//! use pagerline_common::webhook::{sign_payload, verify_signature};
//!
//! let body = br#"{"event":{"id":"01"}}"#;
//! let header = sign_payload(body, b"shh");
//! assert!(verify_signature(body, Some(&header), b"shh").is_ok());
//! ```

pub mod signature;
pub mod verifier;

pub use signature::{compute_signature, sign_payload, SignatureEntry, SignatureSet};
pub use verifier::{verify_signature, SignatureError, WebhookVerifier, DEFAULT_BODY_LIMIT};
