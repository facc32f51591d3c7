//! Outbound error taxonomy
//!
//! Every failure of an outbound call is returned to the immediate caller with
//! enough structure to decide on a retry; nothing here retries on its own.

use std::time::Duration;

use pagerline_common::{
    ApiError, ApiErrorKind, ErrorClassification, ErrorSeverity, ScopeValidationError,
};
use pagerline_domain::PagerlineError;
use thiserror::Error;

/// Coarse grouping of [`ClientError`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorCategory {
    /// No response was received (DNS, connect, timeout, cancellation)
    Transport,
    /// The API answered with a failure status
    Api,
    /// Credential acquisition failed
    Authentication,
    /// A success response could not be decoded
    Decode,
    /// Caller input or client configuration is invalid
    Config,
}

/// Outbound call errors
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    ScopeValidation(#[from] ScopeValidationError),

    #[error("OAuth token exchange failed: {0}")]
    TokenExchange(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("pagination error: {0}")]
    Pagination(String),
}

impl ClientError {
    /// Coarse bucket for logging and metrics.
    pub fn category(&self) -> ClientErrorCategory {
        match self {
            Self::Transport(_) | Self::Timeout(_) | Self::Cancelled => {
                ClientErrorCategory::Transport
            }
            Self::Api(_) => ClientErrorCategory::Api,
            Self::TokenExchange(_) => ClientErrorCategory::Authentication,
            Self::Decode(_) | Self::Pagination(_) => ClientErrorCategory::Decode,
            Self::ScopeValidation(_) | Self::Config(_) => ClientErrorCategory::Config,
        }
    }

    /// The classified remote error, when a response was received.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    fn api_kind(&self) -> Option<ApiErrorKind> {
        self.api_error().map(ApiError::kind)
    }

    /// API answered 400.
    pub fn is_bad_request(&self) -> bool {
        self.api_kind() == Some(ApiErrorKind::BadRequest)
    }

    /// API answered 403.
    pub fn is_forbidden(&self) -> bool {
        self.api_kind() == Some(ApiErrorKind::Forbidden)
    }

    /// API answered 404.
    pub fn is_not_found(&self) -> bool {
        self.api_kind() == Some(ApiErrorKind::NotFound)
    }

    /// API answered 429.
    pub fn is_rate_limited(&self) -> bool {
        self.api_kind() == Some(ApiErrorKind::RateLimited)
    }

    /// 5xx, 429, or a transport failure other than cancellation
    pub fn is_temporary(&self) -> bool {
        match self {
            Self::Api(err) => err.is_temporary(),
            Self::Transport(_) | Self::Timeout(_) => true,
            _ => false,
        }
    }

    /// The caller cancelled the request context.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Map a reqwest failure; `timeout` is the transport's configured budget.
    pub(crate) fn from_transport(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_builder() {
            Self::Config(format!("invalid HTTP request: {err}"))
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl ErrorClassification for ClientError {
    fn is_retryable(&self) -> bool {
        self.is_temporary()
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Api(err) => err.severity(),
            Self::Transport(_) | Self::Timeout(_) => ErrorSeverity::Warning,
            Self::Cancelled => ErrorSeverity::Info,
            Self::TokenExchange(_)
            | Self::Decode(_)
            | Self::Pagination(_)
            | Self::ScopeValidation(_) => ErrorSeverity::Error,
            Self::Config(_) => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    fn retry_after(&self) -> Option<Duration> {
        self.api_error().and_then(|err| err.retry_after)
    }
}

impl From<PagerlineError> for ClientError {
    fn from(err: PagerlineError) -> Self {
        match err {
            PagerlineError::Network(message) => Self::Transport(message),
            PagerlineError::Config(message) => Self::Config(message),
            PagerlineError::Persistence(message) | PagerlineError::Internal(message) => {
                Self::Transport(message)
            }
        }
    }
}
