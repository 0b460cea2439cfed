//! Persistent reindexing status store
//!
//! Typed access to the coordination service for everything reindexing
//! persists: the cluster-wide mutual-exclusion lock and the single
//! serialized [`Reindexing`] record per cluster.
//!
//! The record is opaque bytes to the coordination layer; this module owns
//! the codec (JSON, round-trip equal). Writes are unconditional overwrites —
//! the only serialization guarantee comes from the cluster-wide lock, so a
//! write by a party that does not hold it is silently superseded by the next
//! write from the lock holder.

pub mod coordination;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::status::Reindexing;

pub use coordination::{Coordination, CoordinationError, CoordinationLock};
pub use memory::MemoryCoordination;

/// Default bounded wait for the cluster lock
const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(1);

/// Scoped cluster-wide reindexing lock
///
/// Released when dropped, on every exit path.
#[derive(Debug)]
pub struct ReindexingLock {
    _inner: CoordinationLock,
}

/// Typed wrapper over the coordination service for one cluster
pub struct ReindexingStore {
    coordination: Arc<dyn Coordination>,
    cluster: String,
    lock_wait: Duration,
}

impl ReindexingStore {
    /// Create a store for the given cluster with the default lock wait
    pub fn new(coordination: Arc<dyn Coordination>, cluster: impl Into<String>) -> Self {
        Self::with_lock_wait(coordination, cluster, DEFAULT_LOCK_WAIT)
    }

    /// Create a store with an explicit bound on the lock wait
    pub fn with_lock_wait(
        coordination: Arc<dyn Coordination>,
        cluster: impl Into<String>,
        lock_wait: Duration,
    ) -> Self {
        Self {
            coordination,
            cluster: cluster.into(),
            lock_wait,
        }
    }

    /// Cluster this store persists status for
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    fn lock_path(&self) -> String {
        format!("/reindexing/v1/{}/lock", self.cluster)
    }

    fn status_path(&self) -> String {
        format!("/reindexing/v1/{}/reindexing", self.cluster)
    }

    /// Acquire the cluster-wide reindexing lock with a bounded wait
    ///
    /// Fails with [`Error::LockHeldElsewhere`] if another holder has it when
    /// the wait expires.
    pub async fn lock_reindexing(&self) -> Result<ReindexingLock> {
        let path = self.lock_path();
        match self.coordination.lock(&path, self.lock_wait).await {
            Ok(inner) => {
                debug!(cluster = %self.cluster, "acquired reindexing lock");
                Ok(ReindexingLock { _inner: inner })
            }
            Err(CoordinationError::LockHeld(_)) => {
                Err(Error::LockHeldElsewhere(self.cluster.clone()))
            }
            Err(err) => Err(Error::Coordination(err)),
        }
    }

    /// Current persisted record, or the empty record if none exists yet
    ///
    /// Callable without holding the lock, but only trusted for
    /// decision-making by a caller that currently holds it.
    pub async fn read_reindexing(&self) -> Result<Reindexing> {
        match self.coordination.read(&self.status_path()).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Reindexing::empty()),
        }
    }

    /// Unconditionally overwrite the persisted record
    pub async fn write_reindexing(&self, reindexing: &Reindexing) -> Result<()> {
        let bytes = serde_json::to_vec(reindexing)?;
        self.coordination.write(&self.status_path(), bytes).await?;
        debug!(
            cluster = %self.cluster,
            types = reindexing.status().len(),
            "wrote reindexing record"
        );
        Ok(())
    }
}

impl std::fmt::Debug for ReindexingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReindexingStore")
            .field("cluster", &self.cluster)
            .field("lock_wait", &self.lock_wait)
            .finish_non_exhaustive()
    }
}
