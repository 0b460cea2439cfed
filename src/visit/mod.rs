//! Visit session adapter
//!
//! Translates "reindex this document type" into the parameters of a cluster
//! visit and defines the contract the orchestrator programs against. The
//! visiting transport itself is an external collaborator implementing
//! [`DocumentAccess`]; everything it hands back flows over channels — a
//! progress stream for checkpoint tokens, a one-shot completion signal, and
//! a cancellation signal going the other way.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{Error, Result};
use crate::models::{Cluster, DocumentType, ProgressToken};

/// Buffered checkpoint tokens between transport and orchestrator; the
/// handler on the other side only does a bounded store write, so a small
/// buffer keeps the visiting pipeline from blocking.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 16;

// ============================================================================
// Visit Parameters
// ============================================================================

/// Execution class of a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Background work that must not starve foreground traffic
    Low,
    /// Default execution class
    Normal,
    /// Latency-sensitive work
    High,
}

/// Parameters of one cluster visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitParameters {
    /// Fields to fetch and rewrite; all user fields of the type
    pub field_set: String,

    /// Logical storage partition the document type lives in
    pub bucket_space: String,

    /// Content route addressing the whole cluster
    pub route: String,

    /// Where visited documents are sent for rewriting — the cluster itself
    pub remote_data_handler: String,

    /// Document selection restricting the visit to a single type
    pub selection: String,

    /// Execution class; reindexing always runs low
    pub priority: Priority,

    /// Where to resume from; [`ProgressToken::start`] for a fresh visit
    pub resume_from: ProgressToken,
}

impl VisitParameters {
    /// Build the parameters for reindexing one document type
    ///
    /// Fails with [`Error::InvalidRequest`] if the cluster has no bucket
    /// space for the type; [`crate::reindexer::Reindexer::new`] rules this
    /// out up front, so hitting it here means the caller skipped validation.
    pub fn for_reindexing(
        cluster: &Cluster,
        document_type: &DocumentType,
        resume_from: Option<&ProgressToken>,
    ) -> Result<Self> {
        let bucket_space = cluster
            .bucket_space_of(document_type)
            .ok_or_else(|| Error::InvalidRequest(document_type.name().to_string()))?;

        Ok(Self {
            field_set: document_type.field_set(),
            bucket_space: bucket_space.to_string(),
            route: cluster.route(),
            remote_data_handler: cluster.name().to_string(),
            selection: document_type.name().to_string(),
            priority: Priority::Low,
            resume_from: resume_from.cloned().unwrap_or_else(ProgressToken::start),
        })
    }
}

// ============================================================================
// Visit Handle
// ============================================================================

/// How the transport reports the end of a visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitEnd {
    /// The visit ran to natural completion
    Completed,
    /// The transport gave up, with a short reason
    Failed(String),
    /// The transport stopped because [`VisitControl::abort`] was observed
    Aborted,
}

/// Classified outcome of awaiting a visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitOutcome {
    /// Every document of the type was visited
    Completed,
    /// The visit failed; the reason ends up in the status record
    Failed(String),
    /// Cancellation fired before the visit completed or failed
    Interrupted,
}

/// Cancellation signal from orchestrator to transport
#[derive(Debug, Clone)]
pub struct VisitControl {
    abort: watch::Sender<bool>,
}

impl VisitControl {
    /// Create a control and the signal a transport watches
    pub fn channel() -> (Self, watch::Receiver<bool>) {
        let (abort, signal) = watch::channel(false);
        (Self { abort }, signal)
    }

    /// Ask the transport to stop streaming; the visit then ends with
    /// [`VisitEnd::Aborted`]
    pub fn abort(&self) {
        let _ = self.abort.send(true);
    }
}

/// Live handle on a started visit
///
/// Field-level access is deliberate: the orchestrator's checkpoint loop
/// selects over `progress` and `end` while holding `control` for
/// cancellation, which needs the three halves borrowed independently.
#[derive(Debug)]
pub struct VisitHandle {
    /// Checkpoint tokens, one per delivered document batch
    pub progress: mpsc::Receiver<ProgressToken>,

    /// Resolves exactly once when the visit ends
    pub end: oneshot::Receiver<VisitEnd>,

    /// Cancellation signal to the transport
    pub control: VisitControl,
}

/// The visiting transport the orchestrator programs against
///
/// Implementations must support resumable start from an opaque token, the
/// low-priority execution class, routing by cluster, and batch-delivered
/// progress reports on the handle's channel.
#[async_trait]
pub trait DocumentAccess: Send + Sync {
    /// Start a visit with the given parameters
    async fn start_visit(&self, parameters: VisitParameters) -> VisitHandle;
}
