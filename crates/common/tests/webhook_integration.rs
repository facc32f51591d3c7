//! Integration tests for `pagerline_common::webhook`, exercised through the
//! crate's public re-exports.

use std::io::Cursor;

use pagerline_common::webhook::{sign_payload, verify_signature, SignatureError, WebhookVerifier};
use pagerline_common::SignatureSet;

const SECRET: &[u8] = b"whsec_6b1f0c";
const BODY: &[u8] =
    br#"{"event":{"id":"01DEN4U6","event_type":"incident.triggered","resource_type":"incident"}}"#;

#[test]
fn signed_payload_verifies() {
    let header = sign_payload(BODY, SECRET);
    assert!(header.starts_with("v1="));
    assert!(verify_signature(BODY, Some(&header), SECRET).is_ok());
}

#[test]
fn wrong_secret_is_rejected() {
    let header = sign_payload(BODY, b"another-secret");
    let err = verify_signature(BODY, Some(&header), SECRET).unwrap_err();
    assert!(matches!(err, SignatureError::NoValidSignature));
    assert!(!err.is_malformed());
}

/// Flipping any single byte of the body invalidates the signature.
#[test]
fn every_body_byte_is_covered_by_the_signature() {
    let header = sign_payload(BODY, SECRET);

    for index in 0..BODY.len() {
        let mut tampered = BODY.to_vec();
        tampered[index] ^= 0x01;
        let result = verify_signature(&tampered, Some(&header), SECRET);
        assert!(
            matches!(result, Err(SignatureError::NoValidSignature)),
            "byte {index} was not covered"
        );
    }
}

/// During rotation the header carries one digest per active secret; a
/// garbage entry on either side must not block the valid one.
#[test]
fn rotation_header_accepts_valid_digest_in_any_position() {
    let valid = sign_payload(BODY, SECRET);
    let garbage = "v1=deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

    for header in [format!("{valid},{garbage}"), format!("{garbage},{valid}")] {
        assert!(verify_signature(BODY, Some(&header), SECRET).is_ok(), "{header}");
    }

    let with_spaces = format!("v0=0011, {valid} , v2=ffee");
    assert!(verify_signature(BODY, Some(&with_spaces), SECRET).is_ok());
}

#[test]
fn failure_kinds_are_distinguishable() {
    let header = sign_payload(BODY, SECRET);

    let missing = verify_signature(BODY, None, SECRET).unwrap_err();
    let blank = verify_signature(BODY, Some("   "), SECRET).unwrap_err();
    let no_v1 = verify_signature(BODY, Some("v2=abcdef"), SECRET).unwrap_err();
    let empty_body = verify_signature(b"", Some(&header), SECRET).unwrap_err();
    let mismatch = verify_signature(BODY, Some("v1=00ff00ff"), SECRET).unwrap_err();

    assert!(matches!(missing, SignatureError::MalformedHeader));
    assert!(matches!(blank, SignatureError::MalformedHeader));
    assert!(matches!(no_v1, SignatureError::MalformedHeader));
    assert!(matches!(empty_body, SignatureError::MalformedBody));
    assert!(matches!(mismatch, SignatureError::NoValidSignature));

    assert_ne!(missing.to_string(), empty_body.to_string());
    assert_ne!(empty_body.to_string(), mismatch.to_string());
}

#[test]
fn header_parsing_keeps_unknown_versions() {
    let set = SignatureSet::parse("v1=aa,v9=bb,nonsense");
    assert_eq!(set.entries().len(), 2);
    assert_eq!(set.supported_digests(), vec![vec![0xaa]]);
}

#[test]
fn stream_verification_leaves_body_readable() {
    let header = sign_payload(BODY, SECRET);
    let verifier = WebhookVerifier::new(SECRET);
    let mut stream = Cursor::new(BODY.to_vec());

    let buffered = verifier.verify_reader(&mut stream, Some(&header)).unwrap();
    assert_eq!(buffered, BODY);

    let decoded: serde_json::Value = serde_json::from_reader(&mut stream).unwrap();
    assert_eq!(decoded["event"]["event_type"], "incident.triggered");
}

#[test]
fn rotated_local_secrets_both_verify() {
    let verifier = WebhookVerifier::new(b"old").with_secret(b"new");
    assert!(verifier.verify(BODY, Some(&sign_payload(BODY, b"old"))).is_ok());
    assert!(verifier.verify(BODY, Some(&sign_payload(BODY, b"new"))).is_ok());
    assert!(verifier.verify(BODY, Some(&sign_payload(BODY, b"retired"))).is_err());
}
