//! reindexer - Cluster-scoped reindexing orchestrator
//!
//! Drives a visit-and-rewrite pass over every document of each affected
//! document type in a document-oriented storage cluster: exactly one
//! cluster-wide run at a time, resumable after interruption, with durable
//! status reporting through a coordination service.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Core data structures and types
//! - [`status`] - Reindexing status record and state machine
//! - [`store`] - Coordination-service-backed status store and cluster lock
//! - [`visit`] - Visit parameters and the visiting-transport boundary
//! - [`reindexer`] - The orchestrator control loop
//! - [`clock`] - Injectable clock for deterministic time
//!
//! # Example
//!
//! ```no_run
//! use reindexer::clock::SystemClock;
//! use reindexer::config::ReindexingConfig;
//! use reindexer::reindexer::Reindexer;
//! use reindexer::store::{MemoryCoordination, ReindexingStore};
//! use std::sync::Arc;
//! # use reindexer::visit::{DocumentAccess, VisitHandle, VisitParameters};
//! # use async_trait::async_trait;
//! # struct Transport;
//! # #[async_trait]
//! # impl DocumentAccess for Transport {
//! #     async fn start_visit(&self, _parameters: VisitParameters) -> VisitHandle {
//! #         unimplemented!()
//! #     }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ReindexingConfig::from_file("reindexing.toml")?;
//!     let store = Arc::new(ReindexingStore::new(
//!         Arc::new(MemoryCoordination::new()),
//!         config.cluster.clone(),
//!     ));
//!     let reindexer = Reindexer::new(
//!         config.cluster(),
//!         config.ready(),
//!         store,
//!         Arc::new(Transport),
//!         Arc::new(SystemClock),
//!     )?;
//!     reindexer.reindex().await?;
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod reindexer;
pub mod status;
pub mod store;
pub mod visit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::ReindexingConfig;
    pub use crate::error::{Error, Result};
    pub use crate::models::{Cluster, DocumentType, ProgressToken};
    pub use crate::reindexer::Reindexer;
    pub use crate::status::{Reindexing, State, Status};
    pub use crate::store::{Coordination, MemoryCoordination, ReindexingStore};
    pub use crate::visit::{DocumentAccess, VisitHandle, VisitOutcome, VisitParameters};
}

// Direct re-exports for convenience
pub use error::{Error, Result};
pub use models::{Cluster, DocumentType, ProgressToken};
pub use reindexer::Reindexer;
pub use status::{Reindexing, State, Status};
