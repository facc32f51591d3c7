//! Integration tests for `pagerline_common::error`.
//!
//! These suites exercise classification of failed responses through the
//! public surface only: both wire shapes of the `errors` field, bodies that
//! do not decode, and the status predicates callers branch on.

use std::time::Duration;

use pagerline_common::error::{classify, ApiErrorKind, ErrorClassification, ErrorSeverity};

/// Legacy list bodies and newer field-map bodies decode into the same flat
/// list of messages.
#[test]
fn both_error_shapes_normalize_to_a_flat_list() {
    let legacy = classify(
        400,
        br#"{"error":{"code":2001,"message":"Invalid Input Provided","errors":["Name can't be blank"]}}"#,
    );
    let fields = classify(
        400,
        br#"{"error":{"code":2001,"message":"Invalid Input Provided","errors":{"name":["can't be blank"]}}}"#,
    );

    assert_eq!(legacy.errors, vec!["Name can't be blank".to_string()]);
    assert_eq!(fields.errors, vec!["name: can't be blank".to_string()]);
    assert_eq!(legacy.code, fields.code);
    assert_eq!(legacy.message, "Invalid Input Provided");
    assert!(legacy.decoded && fields.decoded);
}

/// A body that is not an error envelope keeps the status code and falls
/// back to a generic message instead of failing.
#[test]
fn malformed_body_keeps_status_code() {
    let html = classify(503, b"<html><body>Service Unavailable</body></html>");
    assert_eq!(html.status_code, 503);
    assert_eq!(html.kind(), ApiErrorKind::ServerError);
    assert!(!html.decoded);
    assert!(html.code.is_none());
    assert!(html.errors.is_empty());
    assert!(html.to_string().contains("503"));

    let truncated = classify(400, br#"{"error":{"code":20"#);
    assert_eq!(truncated.status_code, 400);
    assert!(truncated.is_bad_request());
    assert!(!truncated.decoded);
}

#[test]
fn predicates_follow_status_code() {
    let cases = [
        (400, ApiErrorKind::BadRequest, false),
        (401, ApiErrorKind::Unknown, false),
        (403, ApiErrorKind::Forbidden, false),
        (404, ApiErrorKind::NotFound, false),
        (429, ApiErrorKind::RateLimited, true),
        (500, ApiErrorKind::ServerError, true),
        (504, ApiErrorKind::ServerError, true),
        (501, ApiErrorKind::Unknown, true),
        (507, ApiErrorKind::Unknown, true),
        (418, ApiErrorKind::Unknown, false),
    ];

    for (status, kind, temporary) in cases {
        let err = classify(status, b"{}");
        assert_eq!(err.kind(), kind, "status {status}");
        assert_eq!(err.is_temporary(), temporary, "status {status}");
        assert_eq!(err.is_retryable(), temporary, "status {status}");
        assert_eq!(err.is_bad_request(), status == 400);
        assert_eq!(err.is_forbidden(), status == 403);
        assert_eq!(err.is_not_found(), status == 404);
        assert_eq!(err.is_rate_limited(), status == 429);
    }
}

#[test]
fn retry_after_is_exposed_through_classification() {
    let err = classify(429, br#"{"error":{"message":"Rate Limit Exceeded"}}"#)
        .with_retry_after(Some(Duration::from_secs(30)));

    assert!(err.is_rate_limited());
    assert_eq!(err.severity(), ErrorSeverity::Warning);
    assert_eq!(ErrorClassification::retry_after(&err), Some(Duration::from_secs(30)));
    assert!(!err.is_critical());
}

#[test]
fn not_found_is_informational() {
    let err = classify(404, br#"{"error":{"code":2100,"message":"Not Found"}}"#);
    assert_eq!(err.severity(), ErrorSeverity::Info);
    assert_eq!(err.code, Some(2100));
}
