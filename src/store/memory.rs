//! In-process coordination backend
//!
//! Backs the [`Coordination`] trait with plain process memory: a key→bytes
//! map plus one async mutex per lock path. Used by the test suites in place
//! of a real coordination service, and usable as-is when every writer lives
//! in one process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::coordination::{Coordination, CoordinationError, CoordinationLock};

/// Coordination backend held entirely in process memory
#[derive(Default)]
pub struct MemoryCoordination {
    values: Mutex<HashMap<String, Vec<u8>>>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl MemoryCoordination {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, path: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

impl std::fmt::Debug for MemoryCoordination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys = self.values.lock().unwrap().len();
        f.debug_struct("MemoryCoordination")
            .field("values", &keys)
            .finish()
    }
}

#[async_trait]
impl Coordination for MemoryCoordination {
    async fn lock(&self, path: &str, wait: Duration) -> Result<CoordinationLock, CoordinationError> {
        let mutex = self.lock_for(path);
        match tokio::time::timeout(wait, mutex.lock_owned()).await {
            Ok(guard) => Ok(CoordinationLock::new(guard)),
            Err(_) => Err(CoordinationError::LockHeld(path.to_string())),
        }
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, CoordinationError> {
        Ok(self.values.lock().unwrap().get(path).cloned())
    }

    async fn write(&self, path: &str, value: Vec<u8>) -> Result<(), CoordinationError> {
        self.values.lock().unwrap().insert(path.to_string(), value);
        Ok(())
    }
}
