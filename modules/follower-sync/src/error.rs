//! Typed errors for a refresh run.

use thiserror::Error;

/// Result type alias for store and startup operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that abort a run or fail a single store call.
#[derive(Debug, Error)]
pub enum SyncError {
    /// `DATABASE_URL` names a driver we have no dialect for
    #[error("unsupported store: {0}")]
    UnsupportedStore(String),

    /// Option values that cannot describe a run
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Why a profile lookup produced no snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The account does not exist (permanent for this run)
    #[error("profile not found: {0}")]
    NotFound(String),

    /// The provider asked us to slow down
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Anything else: connectivity, unexpected status, unparseable body
    #[error("transient failure: {0}")]
    Transient(String),
}
