//! Error taxonomy shared by the lifecycle, parameter and statistics managers.
//!
//! # Propagation
//! - `Validation`, `NotFound`, `Conflict` and `HealthCheckFailed` are reported
//!   to the caller and never leave a partial mutation behind
//! - `Internal` wraps store and transport failures
//! - Publish failures are NOT errors here; they surface as a `Delivery`

use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by control-plane operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Missing or malformed input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown replica, parameter version or statistics key.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate unique key, or a concurrent writer won a compare-and-set.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Registration blocked because the replica's health endpoint did not answer 2xx.
    #[error("health check failed for {url}: {reason}")]
    HealthCheckFailed { url: String, reason: String },

    /// Store or transport failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AdminError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<StoreError> for AdminError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AdminError::NotFound(what),
            StoreError::Conflict(what) => AdminError::Conflict(what),
            StoreError::Backend(what) => AdminError::Internal(what),
        }
    }
}

/// Result type for control-plane operations.
pub type AdminResult<T> = Result<T, AdminError>;
