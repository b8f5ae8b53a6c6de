//! Sensor verification engine
//!
//! Two ordered lookups: existence first, then credential. Keeping them
//! separate lets callers distinguish an unknown sensor from a known sensor
//! with the wrong password.

use state_store::{StateStore, StoreError};
use thiserror::Error;

/// Outcome of a verification pass; not-found and wrong-password are defined
/// outcomes, not failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Sensor exists and the credential matched
    Verified,
    /// No sensor registered under this id
    SensorNotFound,
    /// Sensor exists but the credential did not match
    IncorrectPassword,
}

/// Internal verification failures, wrapped per lookup phase
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("unable to confirm sensor's existence")]
    Existence(#[source] StoreError),

    #[error("unable to confirm password's correctness")]
    Credential(#[source] StoreError),
}

/// Classify a (sensor, pass) pair against the store.
///
/// The existence check always runs before the credential check; a missing
/// sensor short-circuits the credential lookup entirely. The credential
/// comparison happens store-side as a literal equality filter and is not
/// constant-time.
pub async fn verify(
    store: &dyn StateStore,
    sensor: &str,
    pass: &str,
) -> Result<Verification, VerifyError> {
    match store.sensor_exists(sensor).await {
        Ok(true) => {}
        Ok(false) => return Ok(Verification::SensorNotFound),
        Err(err) => return Err(VerifyError::Existence(err)),
    }

    match store.credential_matches(sensor, pass).await {
        Ok(true) => Ok(Verification::Verified),
        Ok(false) => Ok(Verification::IncorrectPassword),
        Err(err) => Err(VerifyError::Credential(err)),
    }
}
