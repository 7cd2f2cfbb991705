//! Managed corpus access for corq
//!
//! Clients for the retrieval, object storage, and corpus administration
//! surfaces of the managed RAG service. Retrieval implements the
//! PassageRetriever trait; administration implements CorpusCatalog.

mod admin;
mod config;
mod retrieval;
mod storage;

pub use admin::CorpusAdmin;
pub use config::{ChunkingConfig, CorpusConfig};
pub use retrieval::VertexRetriever;
pub use storage::StorageClient;

// Re-export core types for convenience
pub use corq_core::{
    CorpusCatalog, CorpusFile, CorpusName, Error, ImportOutcome, Passage, PassageRetriever,
    Result, RetrievalQuery, StorageUri,
};
