//! Error classification shared by every Pagerline error type
//!
//! # Error Handling Architecture
//!
//! 1. **[`ApiError`]**: a non-2xx response normalized into one shape,
//!    whichever error-envelope generation the server speaks.
//!
//! 2. **[`ErrorClassification`] trait**: a standard interface for
//!    classifying errors by their characteristics (retryability, severity,
//!    criticality). The transport core never retries on its own; callers use
//!    this classification to drive their own backoff policy.
//!
//! 3. **[`ErrorSeverity`] enum**: a unified severity level for logging and
//!    alerting decisions.
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected conditions | Resource not found, cancelled calls |
//! | **Warning** | Degraded but operational | Rate limiting, timeouts |
//! | **Error** | Failure requiring attention | Bad request, server errors |
//! | **Critical** | Cannot work until fixed | Invalid client configuration |
//!
//! ## Example
//!
//! ```rust
//! use pagerline_common::error::{classify, ErrorClassification};
//!
//! let err = classify(429, br#"{"error":{"code":2020,"message":"Rate Limit Exceeded"}}"#);
//! assert!(err.is_rate_limited());
//! assert!(err.is_retryable());
//! ```

use std::fmt;
use std::time::Duration;

pub mod api;

pub use api::{classify, ApiError, ApiErrorKind};

/// Standard interface for classifying errors
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient: rate limiting, 5xx responses,
    /// connection failures and timeouts.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    ///
    /// Returns `Some(Duration)` when the server suggested a delay (e.g. a
    /// `Retry-After` header), `None` otherwise.
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning < ErrorSeverity::Error);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
    }

    #[test]
    fn severity_display() {
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
        assert_eq!(ErrorSeverity::Critical.to_string(), "CRITICAL");
    }
}
