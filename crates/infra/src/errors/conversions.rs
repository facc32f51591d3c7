//! Conversions from external infrastructure errors into domain errors.

use pagerline_domain::PagerlineError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PagerlineError);

impl From<InfraError> for PagerlineError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PagerlineError> for InfraError {
    fn from(value: PagerlineError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoPagerlineError {
    fn into_pagerline(self) -> PagerlineError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PagerlineError */
/* -------------------------------------------------------------------------- */

impl IntoPagerlineError for HttpError {
    fn into_pagerline(self) -> PagerlineError {
        if self.is_timeout() {
            return PagerlineError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return PagerlineError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return PagerlineError::Config(format!("invalid HTTP request: {self}"));
        }

        PagerlineError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_pagerline())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → PagerlineError */
/* -------------------------------------------------------------------------- */

impl IntoPagerlineError for std::io::Error {
    fn into_pagerline(self) -> PagerlineError {
        PagerlineError::Persistence(format!("{:?}: {self}", self.kind()))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_pagerline())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
