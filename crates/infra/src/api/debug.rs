//! Opt-in capture of the last exchange for diagnostics

use parking_lot::Mutex;
use reqwest::header::{HeaderMap, AUTHORIZATION};

const REDACTED: &str = "<redacted>";

/// Which parts of the last exchange to keep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugFlags {
    pub capture_last_request: bool,
    pub capture_last_response: bool,
}

impl DebugFlags {
    pub const NONE: Self = Self { capture_last_request: false, capture_last_response: false };
    pub const ALL: Self = Self { capture_last_request: true, capture_last_response: true };
}

/// Outbound request as sent, Authorization value redacted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl CapturedRequest {
    /// First captured value of header `name`, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Last response as received, body included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedResponse {
    /// First captured value of header `name`, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

#[derive(Debug, Default)]
pub(crate) struct DebugCapture {
    flags: DebugFlags,
    last_request: Mutex<Option<CapturedRequest>>,
    last_response: Mutex<Option<CapturedResponse>>,
}

impl DebugCapture {
    pub(crate) fn new(flags: DebugFlags) -> Self {
        Self { flags, ..Self::default() }
    }

    pub(crate) fn record_request(
        &self,
        method: &reqwest::Method,
        url: &url::Url,
        headers: &HeaderMap,
        body: Option<&[u8]>,
    ) {
        if !self.flags.capture_last_request {
            return;
        }
        *self.last_request.lock() = Some(CapturedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: flatten_headers(headers),
            body: body.map(<[u8]>::to_vec),
        });
    }

    pub(crate) fn record_response(&self, status: u16, headers: &HeaderMap, body: &[u8]) {
        if !self.flags.capture_last_response {
            return;
        }
        *self.last_response.lock() =
            Some(CapturedResponse { status, headers: flatten_headers(headers), body: body.to_vec() });
    }

    pub(crate) fn last_request(&self) -> Option<CapturedRequest> {
        self.last_request.lock().clone()
    }

    pub(crate) fn last_response(&self) -> Option<CapturedResponse> {
        self.last_response.lock().clone()
    }
}

fn flatten_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let rendered = if name == AUTHORIZATION || value.is_sensitive() {
                REDACTED.to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.as_str().to_string(), rendered)
        })
        .collect()
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
