//! Unified error handling for the reindexer crate
//!
//! This module provides a single [`Error`] enum covering every failure a
//! caller of [`crate::reindexer::Reindexer`] can observe, together with a
//! re-export of the coordination backend's boundary error.
//!
//! # Propagation policy
//!
//! Only precondition violations ([`Error::InvalidRequest`]), the inability
//! to even start ([`Error::LockHeldElsewhere`]), and coordination-store
//! faults surface as call failures. Steady-state operational outcomes of a
//! run — success, visit failure, interruption — are communicated exclusively
//! through the persisted status record read back via
//! [`crate::store::ReindexingStore::read_reindexing`].

use thiserror::Error;

// Re-export the boundary error for convenience
pub use crate::store::coordination::CoordinationError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for reindexing operations
#[derive(Debug, Error)]
pub enum Error {
    /// A document type in the request is not part of the cluster's
    /// type-to-bucket-space mapping. This is a caller error, raised before
    /// any work is performed.
    #[error("document type '{0}' has no bucket space in this cluster")]
    InvalidRequest(String),

    /// Another run holds the cluster-wide reindexing lock. No work was
    /// performed and no status was written; the caller decides whether and
    /// when to retry.
    #[error("reindexing lock for cluster '{0}' is held elsewhere")]
    LockHeldElsewhere(String),

    /// The coordination backend failed while locking, reading, or writing.
    #[error("coordination store failure: {0}")]
    Coordination(#[from] CoordinationError),

    /// The persisted status record could not be encoded or decoded.
    #[error("reindexing record codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

impl Error {
    /// Check whether this error means the lock was held by another run,
    /// i.e. retrying later is reasonable.
    pub fn is_lock_held(&self) -> bool {
        matches!(self, Self::LockHeldElsewhere(_))
    }
}
