//! Direct-context pipeline: send a local document straight to the model

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use corq_core::{
    Error, GenerationConfig, GenerationResult, LanguageModel, PromptPart, Question, Result,
    mime_type_for,
};

/// Reads a local document, base64-encodes it, and submits a single request
/// with the document as inline model context. No retrieval, no branching.
pub struct DirectContextPipeline<M: LanguageModel> {
    model: Arc<M>,
    config: GenerationConfig,
}

impl<M: LanguageModel> DirectContextPipeline<M> {
    pub fn new(model: Arc<M>, config: GenerationConfig) -> Self {
        Self { model, config }
    }

    /// Ask a question about a local document.
    pub async fn ask(&self, question: &Question, document: &Path) -> Result<GenerationResult> {
        let bytes = tokio::fs::read(document).await.map_err(|e| {
            Error::Configuration(format!("cannot read document {}: {e}", document.display()))
        })?;

        let data = BASE64.encode(&bytes);
        info!(
            document = %document.display(),
            encoded_len = data.len(),
            "document encoded"
        );

        let parts = [
            PromptPart::Text(question.as_str().to_string()),
            PromptPart::InlineData {
                mime_type: mime_type_for(document).to_string(),
                data,
            },
        ];

        self.model.generate_parts(&parts, &self.config).await
    }
}
