//! Signature header parsing and HMAC computation

use hmac::{Hmac, Mac};
use sha2::Sha256;

const SUPPORTED_VERSION: &str = "v1";

type HmacSha256 = Hmac<Sha256>;

/// One `version=hexDigest` pair from a signature header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEntry {
    pub version: String,
    pub digest: String,
}

/// Ordered pairs parsed from one header value
///
/// Entries of versions other than `v1` are kept but never take part in
/// verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureSet {
    entries: Vec<SignatureEntry>,
}

impl SignatureSet {
    /// Parse a header value. Fragments without `=` are dropped.
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let entries = header
            .split(',')
            .filter_map(|fragment| {
                let (version, digest) = fragment.trim().split_once('=')?;
                Some(SignatureEntry {
                    version: version.trim().to_string(),
                    digest: digest.trim().to_string(),
                })
            })
            .collect();

        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[SignatureEntry] {
        &self.entries
    }

    /// Decoded digests of the supported version; empty or undecodable hex
    /// is skipped.
    #[must_use]
    pub fn supported_digests(&self) -> Vec<Vec<u8>> {
        self.entries
            .iter()
            .filter(|entry| entry.version == SUPPORTED_VERSION)
            .filter_map(|entry| hex::decode(&entry.digest).ok())
            .filter(|digest| !digest.is_empty())
            .collect()
    }
}

/// HMAC-SHA256 of `body` keyed with `secret`.
#[must_use]
pub fn compute_signature(body: &[u8], secret: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length; the empty digest never verifies
    // because empty header digests are discarded.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return Vec::new();
    };
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

/// Header value a sender attaches for `body`: `v1=<hex>`.
#[must_use]
pub fn sign_payload(body: &[u8], secret: &[u8]) -> String {
    format!("{SUPPORTED_VERSION}={}", hex::encode(compute_signature(body, secret)))
}
