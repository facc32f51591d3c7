//! OAuth scope grammars
//!
//! Scopes supplied by a caller are validated before any network call is
//! made. An OAuth application is registered with exactly one grammar:
//!
//! - **classic**: `read` or `write`
//! - **scoped** (fine-grained): `resource.permission` tokens such as
//!   `incidents.read` or `users:contact_methods.write`, the `openid` token,
//!   and `as_account-<region>.<subdomain>` account selectors
//!
//! Mixing the two is rejected with a [`ScopeValidationError`] naming the
//! offending scope and the grammar that was expected.

pub mod scopes;

pub use scopes::{
    is_classic_scope, is_scoped_oauth_scope, normalize_scopes, validate_classic_scopes,
    validate_scoped_oauth_scopes, ScopeGrammar, ScopeValidationError,
};
