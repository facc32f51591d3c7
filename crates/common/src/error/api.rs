//! Classification of non-2xx API responses
//!
//! The body of a failed response carries an `error` object whose `errors`
//! field comes in two shapes depending on the endpoint generation:
//!
//! ```text
//! legacy: {"error": {"code": 2001, "message": "Invalid Input", "errors": ["bad thing"]}}
//! newer:  {"error": {"code": 2001, "message": "Invalid Input", "errors": {"name": ["can't be blank"]}}}
//! ```
//!
//! Both decode into the same flat list, the map form rendered as
//! `"<field>: <message>"`. A body that does not parse keeps the status code
//! and falls back to a generic message.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use super::{ErrorClassification, ErrorSeverity};

/// Fixed mapping from HTTP status to error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// 400
    BadRequest,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 429, temporary
    RateLimited,
    /// 500, 502, 503, 504
    ServerError,
    /// Anything else
    Unknown,
}

impl ApiErrorKind {
    #[must_use]
    pub const fn from_status(status_code: u16) -> Self {
        match status_code {
            400 => Self::BadRequest,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            500 | 502 | 503 | 504 => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// A response was received but signaled failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code of the response
    pub status_code: u16,
    /// API-specific error code, when the body carried one
    pub code: Option<i64>,
    pub message: String,
    /// Normalized detail messages
    pub errors: Vec<String>,
    /// Server-suggested delay (from `Retry-After`), attached by the dispatcher
    pub retry_after: Option<Duration>,
    /// `false` when the body could not be decoded as an error envelope
    pub decoded: bool,
    kind: ApiErrorKind,
}

impl ApiError {
    /// Build an error that carries only the status code.
    #[must_use]
    pub fn from_status(status_code: u16) -> Self {
        Self {
            status_code,
            code: None,
            message: format!(
                "HTTP response with status code {status_code} did not contain a decodable error object"
            ),
            errors: Vec::new(),
            retry_after: None,
            decoded: false,
            kind: ApiErrorKind::from_status(status_code),
        }
    }

    #[must_use]
    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    #[must_use]
    pub const fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        self.kind == ApiErrorKind::BadRequest
    }

    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.kind == ApiErrorKind::Forbidden
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::NotFound
    }

    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.kind == ApiErrorKind::RateLimited
    }

    /// 5xx or 429, including 5xx codes outside the [`ApiErrorKind::ServerError`] set
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        self.status_code == 429 || (self.status_code >= 500 && self.status_code <= 599)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.decoded {
            return f.write_str(&self.message);
        }

        write!(
            f,
            "HTTP response failed with status code {}, message: {}",
            self.status_code, self.message
        )?;
        if let Some(code) = self.code {
            write!(f, " (code: {code})")?;
        }
        if !self.errors.is_empty() {
            write!(f, ", errors: {}", self.errors.join("; "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl ErrorClassification for ApiError {
    fn is_retryable(&self) -> bool {
        self.is_temporary()
    }

    fn severity(&self) -> ErrorSeverity {
        match self.kind {
            ApiErrorKind::NotFound => ErrorSeverity::Info,
            ApiErrorKind::RateLimited => ErrorSeverity::Warning,
            ApiErrorKind::BadRequest
            | ApiErrorKind::Forbidden
            | ApiErrorKind::ServerError
            | ApiErrorKind::Unknown => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }
}

/// Turn a non-2xx response body into a typed error.
///
/// Never panics; a malformed body yields [`ApiError::from_status`].
#[must_use]
pub fn classify(status_code: u16, body: &[u8]) -> ApiError {
    let Ok(ErrorEnvelope { error: Some(object) }) = serde_json::from_slice::<ErrorEnvelope>(body)
    else {
        return ApiError::from_status(status_code);
    };

    ApiError {
        status_code,
        code: object.code,
        message: object.message.unwrap_or_default(),
        errors: object.errors.map(ErrorDetails::into_messages).unwrap_or_default(),
        retry_after: None,
        decoded: true,
        kind: ApiErrorKind::from_status(status_code),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorObject>,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<ErrorDetails>,
}

/// Wire shapes of the `errors` field
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetails {
    /// Legacy endpoints
    List(Vec<String>),
    /// Newer endpoints, keyed by field name
    Fields(BTreeMap<String, FieldMessages>),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldMessages {
    Many(Vec<String>),
    One(String),
}

impl ErrorDetails {
    fn into_messages(self) -> Vec<String> {
        match self {
            Self::List(messages) => messages,
            Self::Fields(fields) => fields
                .into_iter()
                .flat_map(|(field, messages)| {
                    let messages = match messages {
                        FieldMessages::Many(many) => many,
                        FieldMessages::One(one) => vec![one],
                    };
                    messages.into_iter().map(move |message| format!("{field}: {message}"))
                })
                .collect(),
            Self::Other(serde_json::Value::Null) => Vec::new(),
            Self::Other(value) => vec![value.to_string()],
        }
    }
}
