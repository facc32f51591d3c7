//! Scope validation and normalization

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

const OPENID_SCOPE: &str = "openid";
const ACCOUNT_SELECTOR_PREFIX: &str = "as_account-";
const PERMISSIONS: [&str; 2] = ["read", "write"];

/// The two scope grammars an OAuth application may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeGrammar {
    Classic,
    Scoped,
}

impl fmt::Display for ScopeGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classic => f.write_str("classic (`read` or `write`)"),
            Self::Scoped => {
                f.write_str("scoped (`resource.permission`, `openid` or `as_account-*`)")
            }
        }
    }
}

/// Caller supplied scopes that do not match the expected grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeValidationError {
    #[error("no OAuth scopes supplied; expected {expected} scopes")]
    Empty { expected: ScopeGrammar },

    #[error("invalid OAuth scope {scope:?}: expected a {expected} scope")]
    Invalid { scope: String, expected: ScopeGrammar },
}

impl ScopeValidationError {
    /// The rejected scope, if the failure concerns a single scope.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        match self {
            Self::Empty { .. } => None,
            Self::Invalid { scope, .. } => Some(scope),
        }
    }
}

/// `read` or `write`
#[must_use]
pub fn is_classic_scope(scope: &str) -> bool {
    PERMISSIONS.contains(&scope)
}

/// `openid`, `as_account-*`, or `resource.permission`
#[must_use]
pub fn is_scoped_oauth_scope(scope: &str) -> bool {
    if scope == OPENID_SCOPE {
        return true;
    }
    if let Some(account) = scope.strip_prefix(ACCOUNT_SELECTOR_PREFIX) {
        return !account.is_empty() && !account.contains(char::is_whitespace);
    }

    let Some((resource, permission)) = scope.rsplit_once('.') else {
        return false;
    };
    PERMISSIONS.contains(&permission)
        && !resource.is_empty()
        && resource.split(':').all(|segment| {
            !segment.is_empty()
                && segment.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        })
}

/// Validate scopes against the classic grammar.
///
/// # Errors
/// Returns [`ScopeValidationError`] naming the first scope that is not
/// `read` or `write`, or `Empty` when no scope is supplied.
pub fn validate_classic_scopes<S: AsRef<str>>(scopes: &[S]) -> Result<(), ScopeValidationError> {
    validate(scopes, ScopeGrammar::Classic, is_classic_scope)
}

/// Validate scopes against the fine-grained grammar.
///
/// # Errors
/// Returns [`ScopeValidationError`] naming the first scope that is not a
/// scoped OAuth token, or `Empty` when no scope is supplied.
pub fn validate_scoped_oauth_scopes<S: AsRef<str>>(
    scopes: &[S],
) -> Result<(), ScopeValidationError> {
    validate(scopes, ScopeGrammar::Scoped, is_scoped_oauth_scope)
}

fn validate<S: AsRef<str>>(
    scopes: &[S],
    expected: ScopeGrammar,
    accepts: fn(&str) -> bool,
) -> Result<(), ScopeValidationError> {
    if scopes.is_empty() {
        return Err(ScopeValidationError::Empty { expected });
    }

    for scope in scopes {
        let scope: &str = scope.as_ref();
        if !accepts(scope) {
            return Err(ScopeValidationError::Invalid { scope: scope.to_string(), expected });
        }
    }
    Ok(())
}

/// Sorted, de-duplicated, space-joined form used for persistence and
/// order-insensitive comparison.
#[must_use]
pub fn normalize_scopes<S: AsRef<str>>(scopes: &[S]) -> String {
    scopes
        .iter()
        .flat_map(|scope| scope.as_ref().split_whitespace())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_grammar_rejects_classic_scope() {
        let err = validate_scoped_oauth_scopes(&["read"]).unwrap_err();
        assert_eq!(err.scope(), Some("read"));
        assert!(err.to_string().contains("\"read\""));
        assert!(err.to_string().contains("scoped"));
    }

    #[test]
    fn classic_grammar_rejects_scoped_scope() {
        let err = validate_classic_scopes(&["incidents.read"]).unwrap_err();
        assert_eq!(err.scope(), Some("incidents.read"));
        assert!(err.to_string().contains("\"incidents.read\""));
        assert!(err.to_string().contains("classic"));
    }

    #[test]
    fn mixed_scope_lists_name_the_intruder() {
        let err =
            validate_scoped_oauth_scopes(&["incidents.read", "write", "services.write"]).unwrap_err();
        assert_eq!(
            err,
            ScopeValidationError::Invalid { scope: "write".into(), expected: ScopeGrammar::Scoped }
        );
    }

    #[test]
    fn accepts_each_scoped_token_form() {
        assert!(validate_scoped_oauth_scopes(&[
            "openid",
            "as_account-us.acme",
            "incidents.read",
            "users:contact_methods.write",
            "analytics.read",
        ])
        .is_ok());
    }

    #[test]
    fn rejects_malformed_scoped_tokens() {
        for scope in ["incidents", "incidents.delete", ".read", "as_account-", "Incidents.read", "a::b.read"] {
            assert!(!is_scoped_oauth_scope(scope), "{scope} should be rejected");
        }
    }

    #[test]
    fn accepts_classic_scopes() {
        assert!(validate_classic_scopes(&["read", "write"]).is_ok());
        assert!(validate_classic_scopes(&["openid"]).is_err());
    }

    #[test]
    fn empty_scope_list_is_rejected() {
        let empty: [&str; 0] = [];
        assert_eq!(
            validate_classic_scopes(&empty),
            Err(ScopeValidationError::Empty { expected: ScopeGrammar::Classic })
        );
        assert!(validate_scoped_oauth_scopes(&empty).is_err());
    }

    #[test]
    fn normalization_is_order_insensitive() {
        assert_eq!(
            normalize_scopes(&["users.read", "incidents.read", "users.read"]),
            "incidents.read users.read"
        );
        assert_eq!(
            normalize_scopes(&["incidents.read users.read"]),
            normalize_scopes(&["users.read", "incidents.read"])
        );
    }
}
