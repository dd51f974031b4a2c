#![forbid(unsafe_code)]

use dss_sp_core::Error;

/// The SP signing identity could not be retrieved.
///
/// Wraps the key-material provider's error, reachable via
/// [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
#[error("SP signing identity unavailable")]
pub struct IdentityError {
    #[source]
    cause: Error,
}

impl IdentityError {
    pub fn new(cause: Error) -> Self {
        Self { cause }
    }

    pub fn cause(&self) -> &Error {
        &self.cause
    }
}

impl From<Error> for IdentityError {
    fn from(cause: Error) -> Self {
        Self::new(cause)
    }
}
