//! Core traits and types for corq
//!
//! This crate defines the fundamental traits and types used across the corq
//! workspace. It provides capability-facing interfaces for language models,
//! passage retrievers, and corpus catalogs, making the system test-friendly
//! and keeping the underlying provider clients swappable.

pub mod corpus;
pub mod error;
pub mod model;
pub mod retriever;
pub mod types;

pub use corpus::{CorpusCatalog, CorpusFile, CorpusName, ImportOutcome, StorageUri};
pub use error::{Error, Result};
pub use model::{GenerationConfig, GenerationResult, LanguageModel, PromptPart, mime_type_for};
pub use retriever::{Passage, PassageRetriever, RetrievalQuery};
pub use types::{Answer, Grounding, PipelineState, Question, QuestionKind, RetryConfig};
