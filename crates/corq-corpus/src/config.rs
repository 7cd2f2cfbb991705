//! Corpus configuration

use serde::{Deserialize, Serialize};
use std::env;

use corq_core::{CorpusName, Error, Result};

/// Chunking applied when a file is imported into the corpus index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: u32,
    pub chunk_overlap: u32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 256,
        }
    }
}

/// Configuration for the corpus-side clients. The corpus reference and the
/// bucket are optional at load time; operations that need them ask via
/// `require_corpus` / `require_bucket` so unrelated commands keep working.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    pub corpus: Option<CorpusName>,
    pub top_k: usize,
    pub bucket: Option<String>,
    pub chunking: ChunkingConfig,
}

impl CorpusConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let corpus = env::var("RAG_CORPUS").ok().map(CorpusName::new);

        let top_k = match env::var("RAG_TOP_K") {
            Ok(raw) => {
                let parsed = raw.parse::<usize>().map_err(|_| {
                    Error::Configuration(format!("RAG_TOP_K is not an integer: {raw}"))
                })?;
                if parsed == 0 {
                    return Err(Error::Configuration(
                        "RAG_TOP_K must be a positive integer".to_string(),
                    ));
                }
                parsed
            }
            Err(_) => 5,
        };

        let bucket = env::var("GCS_BUCKET").ok();

        let chunk_size = match env::var("RAG_CHUNK_SIZE") {
            Ok(raw) => raw.parse::<u32>().map_err(|_| {
                Error::Configuration(format!("RAG_CHUNK_SIZE is not an integer: {raw}"))
            })?,
            Err(_) => 1024,
        };

        let chunk_overlap = match env::var("RAG_CHUNK_OVERLAP") {
            Ok(raw) => raw.parse::<u32>().map_err(|_| {
                Error::Configuration(format!("RAG_CHUNK_OVERLAP is not an integer: {raw}"))
            })?,
            Err(_) => 256,
        };

        Ok(Self {
            corpus,
            top_k,
            bucket,
            chunking: ChunkingConfig {
                chunk_size,
                chunk_overlap,
            },
        })
    }

    /// The configured corpus reference, or a configuration error naming the
    /// missing variable.
    pub fn require_corpus(&self) -> Result<&CorpusName> {
        self.corpus.as_ref().ok_or_else(|| {
            Error::Configuration("RAG_CORPUS environment variable not found".to_string())
        })
    }

    /// The configured storage bucket, or a configuration error naming the
    /// missing variable.
    pub fn require_bucket(&self) -> Result<&str> {
        self.bucket.as_deref().ok_or_else(|| {
            Error::Configuration("GCS_BUCKET environment variable not found".to_string())
        })
    }
}
