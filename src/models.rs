//! Core data structures and types
//!
//! Immutable value types shared across the crate: the document types being
//! reindexed, the cluster they live in, and the opaque progress cursor
//! produced by the visiting transport.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Document Type
// ============================================================================

/// A named document schema stored in the cluster
///
/// The unit of granularity for reindexing. `fields` holds the user fields of
/// the type — everything except system and identifier fields — because
/// reindexing must force recomputation of derived data for the whole
/// document.
///
/// Ordered by name so that iteration over a set of types is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentType {
    name: String,
    fields: Vec<String>,
}

impl DocumentType {
    /// Create a document type with its user fields
    pub fn new<N, F, I>(name: N, fields: I) -> Self
    where
        N: Into<String>,
        F: Into<String>,
        I: IntoIterator<Item = F>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Type name, unique within a cluster
    pub fn name(&self) -> &str {
        &self.name
    }

    /// User fields of this type
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Field set selecting every user field of this type, in the
    /// `<type>:<field>,<field>` form the visiting transport expects
    pub fn field_set(&self) -> String {
        format!("{}:{}", self.name, self.fields.join(","))
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// ============================================================================
// Cluster
// ============================================================================

/// Description of a content cluster eligible for reindexing
///
/// Immutable. Every document type the orchestrator is asked to reindex must
/// be a key in `bucket_spaces`; absence is a caller error caught up front by
/// [`crate::reindexer::Reindexer::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    name: String,
    config_id: String,
    bucket_spaces: HashMap<String, String>,
}

impl Cluster {
    /// Create a cluster description
    ///
    /// `bucket_spaces` maps document type name to the logical storage
    /// partition that type lives in.
    pub fn new(
        name: impl Into<String>,
        config_id: impl Into<String>,
        bucket_spaces: HashMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            config_id: config_id.into(),
            bucket_spaces,
        }
    }

    /// Cluster identifier
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Routing/config identifier
    pub fn config_id(&self) -> &str {
        &self.config_id
    }

    /// Content route addressing the whole cluster, not a specific node;
    /// the visiting transport fans this out
    pub fn route(&self) -> String {
        format!(
            "[Storage:cluster={};clusterconfigid={}]",
            self.name, self.config_id
        )
    }

    /// Bucket space the given document type lives in, if the type is known
    pub fn bucket_space_of(&self, document_type: &DocumentType) -> Option<&str> {
        self.bucket_spaces
            .get(document_type.name())
            .map(String::as_str)
    }
}

// ============================================================================
// Progress Token
// ============================================================================

/// Opaque resumption cursor produced by the visiting transport
///
/// The orchestrator never interprets the contents; it only stores the most
/// recent token so an interrupted visit can resume instead of re-scanning
/// already-visited documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressToken(String);

impl ProgressToken {
    /// Wrap a cursor handed out by the transport
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Token denoting "start from the beginning"
    pub fn start() -> Self {
        Self(String::new())
    }

    /// Raw cursor contents
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this token marks the start of a visit
    pub fn is_start(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProgressToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
