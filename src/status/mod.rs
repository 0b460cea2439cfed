//! Reindexing status model
//!
//! Immutable value types for the single persisted record of a cluster's
//! reindexing history: [`Reindexing`] maps document type names to the
//! [`Status`] of the most recent attempt for that type.
//!
//! All transitions produce new values; nothing is mutated in place. This
//! keeps a snapshot safe to read concurrently while the next write is being
//! prepared, and makes structural equality the natural assertion in tests.
//!
//! # State machine
//!
//! ```text
//! Status::ready(t) ──running()──> RUNNING ──successful(t)──> SUCCESSFUL
//!                                   │  ▲
//!                         progressed│  │(token recorded)
//!                                   ▼  │
//!                                 RUNNING ──failed(t, msg)──> FAILED
//!                                   │
//!                                   └──halted()────────────> HALTED
//! ```
//!
//! `SUCCESSFUL` and `FAILED` drop the progress token — a future attempt
//! starts clean. `HALTED` keeps it, so a resumed attempt picks up where the
//! interrupted one left off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{DocumentType, ProgressToken};

// ============================================================================
// State
// ============================================================================

/// Terminal and non-terminal states of a single reindexing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// The attempt is (or at crash time, was) actively visiting documents
    Running,

    /// The visit completed; every document of the type was rewritten
    Successful,

    /// The visit reported a failure; see [`Status::message`]
    Failed,

    /// The visit was interrupted; the checkpoint token is retained
    Halted,
}

impl State {
    /// Whether this state ends an attempt
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Whether an attempt in this state still has unfinished work
    ///
    /// `HALTED` attempts by definition; `RUNNING` ones too — with no active
    /// lock holder a persisted `RUNNING` status means the orchestrator
    /// crashed mid-visit, and the attempt must be resumed, not treated as
    /// fatal.
    pub fn is_resumable(&self) -> bool {
        matches!(self, Self::Running | Self::Halted)
    }
}

// ============================================================================
// Status
// ============================================================================

/// Staged status for an attempt that has not started yet
///
/// Produced by [`Status::ready`]; its only move is [`Ready::running`], so
/// only fully started statuses can ever be stored in a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ready {
    ready_at: DateTime<Utc>,
}

impl Ready {
    /// Start the attempt
    pub fn running(self) -> Status {
        Status {
            ready_at: self.ready_at,
            started_at: self.ready_at,
            ended_at: None,
            state: State::Running,
            progress: None,
            message: None,
        }
    }
}

/// Immutable record of one document type's most recent reindexing attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// The requested-readiness instant this attempt is satisfying
    ready_at: DateTime<Utc>,

    /// When the attempt started
    started_at: DateTime<Utc>,

    /// When the attempt reached `SUCCESSFUL` or `FAILED`; absent while
    /// `RUNNING` and for `HALTED`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    ended_at: Option<DateTime<Utc>>,

    /// Where the attempt is in its lifecycle
    state: State,

    /// Most recent checkpointed resumption token, if any was taken
    #[serde(skip_serializing_if = "Option::is_none", default)]
    progress: Option<ProgressToken>,

    /// Short failure description; present only when `state` is `FAILED`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    message: Option<String>,
}

impl Status {
    /// Stage a fresh attempt satisfying the readiness requirement `ready_at`
    pub fn ready(ready_at: DateTime<Utc>) -> Ready {
        Ready { ready_at }
    }

    /// Record an intermediate resumption token without changing state
    ///
    /// # Panics
    ///
    /// Panics if the attempt is no longer running; checkpoints of a finished
    /// attempt are a programming error.
    pub fn progressed(self, token: ProgressToken) -> Status {
        assert_eq!(
            self.state,
            State::Running,
            "checkpoint on a {:?} status",
            self.state
        );
        Status {
            progress: Some(token),
            ..self
        }
    }

    /// End the attempt successfully, dropping any progress token so a
    /// future attempt starts clean
    ///
    /// # Panics
    ///
    /// Panics if the attempt is not running.
    pub fn successful(self, ended_at: DateTime<Utc>) -> Status {
        assert_eq!(
            self.state,
            State::Running,
            "completion of a {:?} status",
            self.state
        );
        Status {
            ended_at: Some(ended_at),
            state: State::Successful,
            progress: None,
            message: None,
            ..self
        }
    }

    /// End the attempt as failed, dropping any progress token — failure
    /// invalidates partial progress, so a later retry restarts from scratch
    ///
    /// # Panics
    ///
    /// Panics if the attempt is not running.
    pub fn failed(self, ended_at: DateTime<Utc>, message: impl Into<String>) -> Status {
        assert_eq!(
            self.state,
            State::Running,
            "failure of a {:?} status",
            self.state
        );
        Status {
            ended_at: Some(ended_at),
            state: State::Failed,
            progress: None,
            message: Some(message.into()),
            ..self
        }
    }

    /// Mark the attempt halted, keeping the last checkpointed token so a
    /// future attempt resumes rather than re-scanning
    ///
    /// # Panics
    ///
    /// Panics if the attempt is not running.
    pub fn halted(self) -> Status {
        assert_eq!(
            self.state,
            State::Running,
            "halt of a {:?} status",
            self.state
        );
        Status {
            state: State::Halted,
            ..self
        }
    }

    /// Readiness requirement this attempt satisfies
    pub fn ready_at(&self) -> DateTime<Utc> {
        self.ready_at
    }

    /// When the attempt started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the attempt ended, if it reached `SUCCESSFUL` or `FAILED`
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Current state of the attempt
    pub fn state(&self) -> State {
        self.state
    }

    /// Last checkpointed resumption token, if any
    pub fn progress(&self) -> Option<&ProgressToken> {
        self.progress.as_ref()
    }

    /// Failure description, present only for `FAILED`
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

// ============================================================================
// Reindexing record
// ============================================================================

/// The single persisted reindexing record for a cluster
///
/// Logically a map from document type name to the [`Status`] of that type's
/// most recent attempt. The empty record means no type has ever been
/// processed. Keys are kept sorted so iteration and serialization are
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reindexing {
    #[serde(default)]
    status: BTreeMap<String, Status>,
}

impl Reindexing {
    /// Record with no history for any document type
    pub fn empty() -> Self {
        Self::default()
    }

    /// Copy of this record with the status of `document_type` replaced
    pub fn with(mut self, document_type: &DocumentType, status: Status) -> Self {
        self.status
            .insert(document_type.name().to_string(), status);
        self
    }

    /// All per-type statuses, keyed by document type name
    pub fn status(&self) -> &BTreeMap<String, Status> {
        &self.status
    }

    /// Status of the given document type's most recent attempt, if any
    pub fn status_of(&self, document_type: &DocumentType) -> Option<&Status> {
        self.status.get(document_type.name())
    }
}
