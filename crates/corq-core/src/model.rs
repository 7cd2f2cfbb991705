//! Language model trait and generation types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::Result;

/// Configuration for text generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model_id: String,
    pub temperature: Option<f32>,
    pub max_tokens: u32,
    pub top_p: Option<f32>,
    pub stop_sequences: Vec<String>,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_id: "gemini-2.5-flash".to_string(),
            temperature: Some(0.7),
            max_tokens: 8192,
            top_p: None,
            stop_sequences: Vec::new(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Result of a text generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    pub model_id: String,
    pub tokens_used: Option<u32>,
}

/// One part of a prompt: plain text, or a document sent inline as model
/// context (base64-encoded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPart {
    Text(String),
    InlineData { mime_type: String, data: String },
}

/// MIME type for a local file, by extension. Falls back to a generic
/// binary type for anything unrecognized.
pub fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

/// Trait for language model providers (e.g. Vertex AI Gemini)
///
/// The capability is deliberately narrow: invoke the model with a prompt and
/// an optional response schema, and get a structured or free-text result
/// back. Provider clients stay swappable and mockable in tests.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Resolve credentials and prepare the client for requests.
    async fn connect(&mut self) -> Result<()>;

    /// Generate free text with the client's default configuration.
    async fn generate(&self, prompt: &str) -> Result<GenerationResult>;

    /// Generate free text with an explicit configuration.
    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult>;

    /// Generate from multimodal parts (text plus inline documents).
    async fn generate_parts(
        &self,
        parts: &[PromptPart],
        config: &GenerationConfig,
    ) -> Result<GenerationResult>;

    /// Generate a JSON value constrained by a response schema.
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
        config: &GenerationConfig,
    ) -> Result<serde_json::Value>;

    /// Model identifier requests are issued against.
    fn model_id(&self) -> &str;
}
