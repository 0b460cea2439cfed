//! Coordination service boundary
//!
//! The external coordination service (distributed locks plus a small
//! persistent key-value space) is consumed behind the [`Coordination`]
//! trait, never reimplemented here. Backends only need three primitives:
//! a bounded-wait path lock, a keyed read, and a keyed unconditional write.

use async_trait::async_trait;
use std::any::Any;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a coordination backend
#[derive(Debug, Error)]
pub enum CoordinationError {
    /// The lock is held by another owner and the bounded wait expired.
    /// This is fail-fast by design; callers needing retries apply their own
    /// backoff above this layer.
    #[error("lock at '{0}' is held by another owner")]
    LockHeld(String),

    /// The backend itself failed (connection loss, session expiry, ...)
    #[error("coordination backend failure: {0}")]
    Backend(String),
}

/// Scoped lock handle returned by [`Coordination::lock`]
///
/// Dropping the handle releases the lock. Holding release in `Drop` is what
/// guarantees the cluster lock never outlives a run, whatever exit path the
/// run takes.
pub struct CoordinationLock {
    _guard: Box<dyn Any + Send>,
}

impl CoordinationLock {
    /// Wrap a backend-specific guard whose `Drop` releases the lock
    pub fn new(guard: impl Any + Send) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

impl std::fmt::Debug for CoordinationLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinationLock").finish_non_exhaustive()
    }
}

/// Minimal client surface of the coordination service
#[async_trait]
pub trait Coordination: Send + Sync {
    /// Acquire the lock at `path`, waiting at most `wait`
    ///
    /// Fails with [`CoordinationError::LockHeld`] if another owner holds it
    /// when the wait expires; never queues indefinitely.
    async fn lock(&self, path: &str, wait: Duration) -> Result<CoordinationLock, CoordinationError>;

    /// Read the value stored at `path`, if any
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, CoordinationError>;

    /// Unconditionally overwrite the value at `path`
    ///
    /// No compare-and-swap; serialization is the caller's concern (here,
    /// the cluster-wide reindexing lock).
    async fn write(&self, path: &str, value: Vec<u8>) -> Result<(), CoordinationError>;
}
