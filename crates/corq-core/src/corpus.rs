//! Managed corpus identifiers and catalog trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Result;

/// Fully qualified resource name of a managed corpus
/// (`projects/{project}/locations/{location}/ragCorpora/{id}`).
/// Configured externally; never created or mutated by the query path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusName(String);

impl CorpusName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorpusName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `gs://bucket/object` URI produced by the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUri(String);

impl StorageUri {
    /// Build a URI from bucket and object names. A leading `gs://` on the
    /// bucket is tolerated so configured values can carry either form.
    pub fn new(bucket: &str, object: &str) -> Self {
        let bucket = bucket.trim_start_matches("gs://").trim_end_matches('/');
        Self(format!("gs://{bucket}/{object}"))
    }

    pub fn from_raw(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata for a file registered in a corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusFile {
    pub display_name: String,
    pub resource_name: String,
    pub uri: Option<String>,
    /// Indexing state as reported by the service (e.g. `ACTIVE`).
    pub state: String,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

/// Outcome of an import request. `accepted` means the service took the
/// request; indexing completes asynchronously and is observed out-of-band
/// via the operation name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub operation: String,
    pub accepted: bool,
}

/// Trait for listing what a corpus contains. This is a catalog read, not a
/// retrieval call; overview answers use it for context.
#[async_trait]
pub trait CorpusCatalog: Send + Sync {
    async fn list_files(&self, corpus: &CorpusName) -> Result<Vec<CorpusFile>>;
}
