//! Passage retrieval trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{CorpusName, Result};

/// A retrieval request against a managed corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub text: String,
    pub corpus: CorpusName,
    pub top_k: usize,
}

/// A passage returned by the corpus, scored by relevance.
/// Lives for a single pipeline run; nothing is cached or persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub source_id: String,
    pub text: String,
    pub score: f32,
}

/// Trait for passage retrievers backed by a managed retrieval service.
#[async_trait]
pub trait PassageRetriever: Send + Sync {
    /// Top passages for a query, ordered by descending relevance score,
    /// at most `top_k` of them.
    async fn retrieve(&self, query: &RetrievalQuery) -> Result<Vec<Passage>>;
}
