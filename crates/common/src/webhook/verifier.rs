//! Webhook delivery verification
//!
//! Verification is a pure function of (body, header, secrets) and is safe to
//! call concurrently for independent requests.

use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::debug;

use super::signature::{compute_signature, SignatureSet};

/// Default ceiling on the body bytes read for verification (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Why a webhook delivery failed verification
#[derive(Debug, Error)]
pub enum SignatureError {
    /// Header absent, or no `v1` signature in it
    #[error("webhook signature header is missing or carries no v1 signature")]
    MalformedHeader,

    /// Body empty, or larger than the configured ceiling
    #[error("webhook body is empty or exceeds the size limit")]
    MalformedBody,

    /// Well-formed request, but no signature matched the shared secret
    #[error("no valid webhook signature found")]
    NoValidSignature,

    /// The body stream could not be read or rewound
    #[error("failed to read webhook body: {0}")]
    Io(#[from] std::io::Error),
}

impl SignatureError {
    /// `true` when the request shape itself is broken (answer 400).
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedHeader | Self::MalformedBody)
    }
}

/// Verifies deliveries against one or more local secrets
///
/// Holding several secrets supports the receiving side of a rotation: any
/// secret matching any `v1` digest accepts the delivery.
#[derive(Clone)]
pub struct WebhookVerifier {
    secrets: Vec<Vec<u8>>,
    body_limit: usize,
}

impl WebhookVerifier {
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self { secrets: vec![secret.as_ref().to_vec()], body_limit: DEFAULT_BODY_LIMIT }
    }

    /// Accept an additional secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl AsRef<[u8]>) -> Self {
        self.secrets.push(secret.as_ref().to_vec());
        self
    }

    #[must_use]
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    #[must_use]
    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    /// Verify an already-buffered body.
    ///
    /// # Errors
    /// [`SignatureError::MalformedHeader`], [`SignatureError::MalformedBody`]
    /// or [`SignatureError::NoValidSignature`].
    pub fn verify(&self, body: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
        let digests = Self::extract_digests(header)?;
        if body.is_empty() || body.len() > self.body_limit {
            debug!(body_len = body.len(), limit = self.body_limit, "webhook body rejected");
            return Err(SignatureError::MalformedBody);
        }
        self.match_digests(body, &digests)
    }

    /// Verify a body stream, leaving it positioned where it started.
    ///
    /// At most `body_limit + 1` bytes are read. On success the buffered body
    /// is returned so the caller can decode it without reading again.
    ///
    /// # Errors
    /// Same as [`WebhookVerifier::verify`], plus [`SignatureError::Io`] when
    /// the stream cannot be read or rewound.
    pub fn verify_reader<R: Read + Seek>(
        &self,
        body: &mut R,
        header: Option<&str>,
    ) -> Result<Vec<u8>, SignatureError> {
        let digests = Self::extract_digests(header)?;

        let start = body.stream_position()?;
        let read = self.read_bounded(body);
        body.seek(SeekFrom::Start(start))?;
        let buffer = read?;

        if buffer.is_empty() || buffer.len() > self.body_limit {
            debug!(limit = self.body_limit, "webhook body rejected");
            return Err(SignatureError::MalformedBody);
        }
        self.match_digests(&buffer, &digests)?;
        Ok(buffer)
    }

    fn read_bounded<R: Read>(&self, body: &mut R) -> std::io::Result<Vec<u8>> {
        let ceiling = u64::try_from(self.body_limit).unwrap_or(u64::MAX).saturating_add(1);
        let mut buffer = Vec::new();
        body.take(ceiling).read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn extract_digests(header: Option<&str>) -> Result<Vec<Vec<u8>>, SignatureError> {
        let header = header.filter(|value| !value.trim().is_empty()).ok_or_else(|| {
            debug!("webhook signature header missing");
            SignatureError::MalformedHeader
        })?;

        let digests = SignatureSet::parse(header).supported_digests();
        if digests.is_empty() {
            debug!("webhook signature header carries no v1 signature");
            return Err(SignatureError::MalformedHeader);
        }
        Ok(digests)
    }

    fn match_digests(&self, body: &[u8], digests: &[Vec<u8>]) -> Result<(), SignatureError> {
        let matched = self.secrets.iter().any(|secret| {
            let expected = compute_signature(body, secret);
            digests.iter().any(|digest| bool::from(expected.ct_eq(digest.as_slice())))
        });

        if matched {
            Ok(())
        } else {
            debug!(candidates = digests.len(), "no webhook signature matched");
            Err(SignatureError::NoValidSignature)
        }
    }
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secrets", &format_args!("<{} redacted>", self.secrets.len()))
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

/// Verify `body` against `header` with a single shared secret.
///
/// # Errors
/// See [`WebhookVerifier::verify`].
pub fn verify_signature(
    body: &[u8],
    header: Option<&str>,
    secret: impl AsRef<[u8]>,
) -> Result<(), SignatureError> {
    WebhookVerifier::new(secret).verify(body, header)
}
