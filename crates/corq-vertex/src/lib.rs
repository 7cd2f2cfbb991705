//! Vertex AI Gemini integration for corq
//!
//! This crate provides the Gemini implementation of the LanguageModel trait,
//! plus the access-token plumbing shared with the corpus-side clients.

mod auth;
mod client;
mod config;

#[cfg(test)]
mod tests;

pub use auth::resolve_access_token;
pub use client::GeminiClient;
pub use config::VertexConfig;

// Re-export core types for convenience
pub use corq_core::{
    Error, GenerationConfig, GenerationResult, LanguageModel, PromptPart, Result, RetryConfig,
};
