//! Common test utilities
//!
//! A scripted stand-in for the visiting transport, plus small helpers for
//! clocks, clusters, and polling the status store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

use reindexer::models::{Cluster, DocumentType, ProgressToken};
use reindexer::status::Reindexing;
use reindexer::store::ReindexingStore;
use reindexer::visit::{
    DocumentAccess, VisitControl, VisitEnd, VisitHandle, VisitParameters,
    PROGRESS_CHANNEL_CAPACITY,
};

/// Initialize test logging once; repeat calls are no-ops
#[allow(dead_code)]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Instant `n` milliseconds after the Unix epoch
pub fn ms(n: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::milliseconds(n)
}

/// The `music` document type used throughout the scenarios
pub fn music() -> DocumentType {
    DocumentType::new("music", ["artist"])
}

/// A one-type cluster matching [`music`]
pub fn cluster() -> Cluster {
    Cluster::new(
        "cluster",
        "id",
        HashMap::from([("music".to_string(), "default".to_string())]),
    )
}

/// Poll the store until `predicate` holds, panicking after five seconds
#[allow(dead_code)]
pub async fn wait_until(
    store: &ReindexingStore,
    predicate: impl Fn(&Reindexing) -> bool,
) -> Reindexing {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        let record = store.read_reindexing().await.unwrap();
        if predicate(&record) {
            return record;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "condition not reached within five seconds; last record: {record:?}"
        );
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
}

// ============================================================================
// Scripted transport
// ============================================================================

/// One step a scripted visit performs
#[derive(Debug, Clone)]
pub enum VisitStep {
    /// Deliver a batch and its checkpoint token
    Progress(ProgressToken),
    /// Finish the visit successfully
    Complete,
    /// Finish the visit with a failure
    Fail(String),
    /// Block until the orchestrator aborts the visit
    Hold,
}

/// Scripted [`DocumentAccess`] implementation
///
/// Each started visit pops the next script and plays it; a visit with no
/// script completes immediately. Every set of parameters handed to
/// `start_visit` is recorded for assertions.
#[derive(Default)]
pub struct ScriptedAccess {
    scripts: Mutex<VecDeque<Vec<VisitStep>>>,
    seen: Mutex<Vec<VisitParameters>>,
}

impl ScriptedAccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the script for the next started visit
    pub fn with_script(self, steps: Vec<VisitStep>) -> Self {
        self.scripts.lock().unwrap().push_back(steps);
        self
    }

    /// Parameters of every visit started so far
    #[allow(dead_code)]
    pub fn seen(&self) -> Vec<VisitParameters> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentAccess for ScriptedAccess {
    async fn start_visit(&self, parameters: VisitParameters) -> VisitHandle {
        self.seen.lock().unwrap().push(parameters);
        let steps = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| vec![VisitStep::Complete]);

        let (progress_tx, progress) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        let (end_tx, end) = oneshot::channel();
        let (control, mut abort) = VisitControl::channel();

        tokio::spawn(async move {
            let end_value = 'run: {
                for step in steps {
                    match step {
                        VisitStep::Progress(token) => {
                            if progress_tx.send(token).await.is_err() {
                                break 'run VisitEnd::Aborted;
                            }
                        }
                        VisitStep::Complete => break 'run VisitEnd::Completed,
                        VisitStep::Fail(reason) => break 'run VisitEnd::Failed(reason),
                        VisitStep::Hold => {
                            let _ = abort.wait_for(|&stop| stop).await;
                            break 'run VisitEnd::Aborted;
                        }
                    }
                }
                VisitEnd::Completed
            };
            let _ = end_tx.send(end_value);
        });

        VisitHandle {
            progress,
            end,
            control,
        }
    }
}
