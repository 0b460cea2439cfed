//! Configuration management for reindexing runs
//!
//! The operator-facing description of a cluster and its readiness
//! requirements, loaded from TOML. This is the file-based equivalent of the
//! config derivation the surrounding system performs on deployment: each
//! document type gets its bucket space, its user fields, and the earliest
//! instant its reindexing may start.
//!
//! # Example
//!
//! ```toml
//! cluster = "search"
//! config_id = "search/cluster.search"
//!
//! [document_types.music]
//! bucket_space = "default"
//! fields = ["artist", "title"]
//! ready_at = "2024-01-01T00:00:00Z"
//! ```

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::models::{Cluster, DocumentType};

/// Bucket spaces a document type may be mapped to
const KNOWN_BUCKET_SPACES: [&str; 2] = ["default", "global"];

/// Per-document-type reindexing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTypeConfig {
    /// Logical storage partition the type lives in
    pub bucket_space: String,

    /// User fields of the type (everything except system/identifier fields)
    pub fields: Vec<String>,

    /// Earliest instant reindexing of this type may start (RFC 3339)
    pub ready_at: DateTime<Utc>,
}

/// Reindexing configuration for one cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReindexingConfig {
    /// Cluster identifier
    pub cluster: String,

    /// Routing/config identifier of the cluster
    pub config_id: String,

    /// Settings per document type, keyed by type name
    #[serde(default)]
    pub document_types: HashMap<String, DocumentTypeConfig>,
}

impl ReindexingConfig {
    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.cluster.is_empty() {
            bail!("cluster must not be empty");
        }
        if self.config_id.is_empty() {
            bail!("config_id must not be empty");
        }
        for (name, settings) in &self.document_types {
            if !KNOWN_BUCKET_SPACES.contains(&settings.bucket_space.as_str()) {
                bail!(
                    "document type '{}' has unknown bucket space '{}'",
                    name,
                    settings.bucket_space
                );
            }
            if settings.fields.is_empty() {
                bail!("document type '{}' has no fields to reindex", name);
            }
        }
        Ok(())
    }

    /// Cluster description derived from this configuration
    pub fn cluster(&self) -> Cluster {
        let bucket_spaces = self
            .document_types
            .iter()
            .map(|(name, settings)| (name.clone(), settings.bucket_space.clone()))
            .collect();
        Cluster::new(self.cluster.clone(), self.config_id.clone(), bucket_spaces)
    }

    /// Readiness request derived from this configuration
    pub fn ready(&self) -> BTreeMap<DocumentType, DateTime<Utc>> {
        self.document_types
            .iter()
            .map(|(name, settings)| {
                (
                    DocumentType::new(name.clone(), settings.fields.clone()),
                    settings.ready_at,
                )
            })
            .collect()
    }
}
