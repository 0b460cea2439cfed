//! Reindexing orchestrator
//!
//! The control loop at the heart of the crate: decides which document types
//! are due, acquires the cluster-wide lock, runs one visit per due type,
//! checkpoints progress as batches stream in, classifies the outcome, and
//! persists the updated status record.
//!
//! One cluster-wide run at a time; [`Reindexer::reindex`] is the single
//! entry point. Per-type failures are recorded in the status record, never
//! raised — the only call failures are an invalid request, the lock being
//! held elsewhere, and coordination-store faults.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::models::{Cluster, DocumentType};
use crate::status::{Reindexing, Status};
use crate::store::ReindexingStore;
use crate::visit::{DocumentAccess, VisitEnd, VisitHandle, VisitOutcome, VisitParameters};

/// Stand-in deadline for visits with no operator bound; far enough out to
/// never fire within a run.
const NO_DEADLINE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Cluster-scoped reindexing orchestrator
///
/// Effectively stateless between calls: everything durable lives in the
/// status record, and token continuity is read back from the store at the
/// start of each run.
pub struct Reindexer {
    cluster: Cluster,
    ready: BTreeMap<DocumentType, DateTime<Utc>>,
    store: Arc<ReindexingStore>,
    access: Arc<dyn DocumentAccess>,
    clock: Arc<dyn Clock>,
    shutdown: watch::Sender<bool>,
    visit_deadline: Option<Duration>,
}

impl Reindexer {
    /// Create an orchestrator for one cluster
    ///
    /// `ready` maps each document type to the earliest instant its
    /// reindexing may start. Every type in `ready` must be mapped to a
    /// bucket space in `cluster`; a missing mapping is a caller error and
    /// fails fast with [`Error::InvalidRequest`].
    pub fn new(
        cluster: Cluster,
        ready: BTreeMap<DocumentType, DateTime<Utc>>,
        store: Arc<ReindexingStore>,
        access: Arc<dyn DocumentAccess>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        for document_type in ready.keys() {
            if cluster.bucket_space_of(document_type).is_none() {
                return Err(Error::InvalidRequest(document_type.name().to_string()));
            }
        }
        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            cluster,
            ready,
            store,
            access,
            clock,
            shutdown,
            visit_deadline: None,
        })
    }

    /// Bound the wall time of each visit; expiry behaves like cancellation,
    /// halting the type with its checkpoint kept
    pub fn with_visit_deadline(mut self, deadline: Duration) -> Self {
        self.visit_deadline = Some(deadline);
        self
    }

    /// Signal cancellation: no new visit starts, and an in-flight visit is
    /// aborted and recorded as `HALTED` with its checkpoint preserved
    ///
    /// Sticky — a shut-down orchestrator stays shut down.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Run reindexing for every document type that is due
    ///
    /// Holds the cluster-wide lock for the entire call. Fails with
    /// [`Error::LockHeldElsewhere`] if another run holds it; otherwise
    /// per-type outcomes land in the status record and the call returns
    /// `Ok(())`.
    pub async fn reindex(&self) -> Result<()> {
        let _lock = self.store.lock_reindexing().await?;
        // The in-memory copy is authoritative for the whole run; writes
        // injected by others while we hold the lock are overwritten at the
        // next checkpoint.
        let mut reindexing = self.store.read_reindexing().await?;
        let now = self.clock.now();

        for (document_type, ready_at) in &self.ready {
            if *self.shutdown.borrow() {
                info!(cluster = %self.cluster.name(), "shutdown requested, stopping run");
                break;
            }
            if now < *ready_at {
                debug!(
                    document_type = %document_type,
                    ready_at = %ready_at,
                    "readiness instant not reached, skipping"
                );
                continue;
            }
            // A type is due when it has never been attempted, when the
            // requirement was raised past the last attempt, or when the
            // last attempt left unfinished work behind (halted, or still
            // marked running after a crash).
            let due = match reindexing.status_of(document_type) {
                None => true,
                Some(status) => {
                    status.ready_at() < *ready_at || status.state().is_resumable()
                }
            };
            if !due {
                debug!(
                    document_type = %document_type,
                    "requirement already satisfied by a finished attempt, skipping"
                );
                continue;
            }
            reindexing = self
                .progress(document_type, *ready_at, reindexing)
                .await?;
        }
        Ok(())
    }

    /// Run one document type's visit to an outcome, checkpointing along the
    /// way, and return the record including its terminal status
    async fn progress(
        &self,
        document_type: &DocumentType,
        ready_at: DateTime<Utc>,
        mut reindexing: Reindexing,
    ) -> Result<Reindexing> {
        // Carry the prior checkpoint forward so a halted attempt resumes
        // instead of restarting.
        let carried = reindexing
            .status_of(document_type)
            .and_then(|status| status.progress().cloned());

        let mut status = Status::ready(ready_at).running();
        if let Some(token) = carried {
            status = status.progressed(token);
        }
        reindexing = reindexing.with(document_type, status.clone());
        self.store.write_reindexing(&reindexing).await?;

        info!(
            cluster = %self.cluster.name(),
            document_type = %document_type,
            resuming = status.progress().is_some(),
            "starting reindexing visit"
        );

        let parameters =
            VisitParameters::for_reindexing(&self.cluster, document_type, status.progress())?;
        let VisitHandle {
            mut progress,
            mut end,
            control,
        } = self.access.start_visit(parameters).await;

        let mut shutdown = self.shutdown.subscribe();
        let deadline = tokio::time::sleep(self.visit_deadline.unwrap_or(NO_DEADLINE));
        tokio::pin!(deadline);
        let mut aborted = false;
        let mut progress_open = true;

        let outcome = loop {
            tokio::select! {
                token = progress.recv(), if progress_open => match token {
                    Some(token) => {
                        debug!(document_type = %document_type, "checkpointing progress");
                        status = status.progressed(token);
                        reindexing = reindexing.with(document_type, status.clone());
                        self.store.write_reindexing(&reindexing).await?;
                    }
                    None => progress_open = false,
                },
                end_result = &mut end => {
                    break match end_result {
                        Ok(VisitEnd::Completed) => VisitOutcome::Completed,
                        Ok(VisitEnd::Failed(reason)) => VisitOutcome::Failed(reason),
                        Ok(VisitEnd::Aborted) => VisitOutcome::Interrupted,
                        Err(_) if aborted => VisitOutcome::Interrupted,
                        Err(_) => {
                            VisitOutcome::Failed("visit transport closed unexpectedly".to_string())
                        }
                    };
                }
                // The guard returned by wait_for is dropped inside the
                // branch so the future stays Send and spawnable.
                _ = async { let _ = shutdown.wait_for(|&stop| stop).await; }, if !aborted => {
                    info!(document_type = %document_type, "interrupting visit on shutdown");
                    control.abort();
                    aborted = true;
                }
                _ = &mut deadline, if !aborted => {
                    info!(document_type = %document_type, "visit deadline reached, halting");
                    control.abort();
                    aborted = true;
                }
            }
        };

        status = match outcome {
            VisitOutcome::Completed => {
                info!(document_type = %document_type, "reindexing complete");
                status.successful(self.clock.now())
            }
            VisitOutcome::Failed(reason) => {
                warn!(document_type = %document_type, reason = %reason, "reindexing failed");
                status.failed(self.clock.now(), reason)
            }
            VisitOutcome::Interrupted => {
                info!(document_type = %document_type, "reindexing halted");
                status.halted()
            }
        };
        reindexing = reindexing.with(document_type, status);
        self.store.write_reindexing(&reindexing).await?;
        Ok(reindexing)
    }
}

impl std::fmt::Debug for Reindexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reindexer")
            .field("cluster", &self.cluster.name())
            .field("types", &self.ready.len())
            .finish_non_exhaustive()
    }
}
