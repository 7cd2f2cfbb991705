//! Answer generation with grounding context

use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use corq_core::{
    Answer, Error, GenerationConfig, Grounding, LanguageModel, Passage, Question, Result,
};

const ANSWER_PROMPT: &str = "You are a helpful assistant. Answer the user's question using the provided context. \
Cite the sources you used by the identifier shown in square brackets. \
If no context is provided, answer as best you can and leave citations empty.";

fn answer_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "answer": {"type": "string"},
            "citations": {
                "type": "array",
                "items": {"type": "string"},
            }
        },
        "required": ["answer", "citations"],
    })
}

/// Generates a structured answer from a question and optional grounding
/// passages, enforcing that citations only name supplied passages.
pub struct AnswerGenerator<M: LanguageModel> {
    model: Arc<M>,
    config: GenerationConfig,
}

#[derive(Deserialize)]
struct RawAnswer {
    answer: String,
    #[serde(default)]
    citations: Vec<String>,
}

impl<M: LanguageModel> AnswerGenerator<M> {
    pub fn new(model: Arc<M>, config: GenerationConfig) -> Self {
        Self { model, config }
    }

    /// Render passages as numbered grounding blocks tagged with source ids.
    pub fn build_context(passages: &[Passage]) -> String {
        let mut context = String::from("Context passages:\n\n");
        for (i, passage) in passages.iter().enumerate() {
            context.push_str(&format!(
                "{}. [{}] {}\n\n",
                i + 1,
                passage.source_id,
                passage.text
            ));
        }
        context
    }

    async fn invoke(&self, prompt: &str) -> Result<RawAnswer> {
        let value = self
            .model
            .generate_structured(prompt, &answer_schema(), &self.config)
            .await?;

        serde_json::from_value(value)
            .map_err(|e| Error::SchemaValidation(format!("malformed answer payload: {e}")))
    }

    /// Answer a question grounded on the supplied passages. Tolerates an
    /// empty passage set and produces an uncited best-effort answer.
    pub async fn generate(&self, question: &Question, passages: &[Passage]) -> Result<Answer> {
        let mut prompt = String::from(ANSWER_PROMPT);
        prompt.push_str("\n\n");
        if !passages.is_empty() {
            prompt.push_str(&Self::build_context(passages));
            prompt.push_str("---\n\n");
        }
        prompt.push_str(&format!("Question: {question}"));

        let raw = self.invoke(&prompt).await?;

        let known: HashSet<&str> = passages.iter().map(|p| p.source_id.as_str()).collect();
        let mut citations: Vec<String> = Vec::new();
        for citation in raw.citations {
            if !known.contains(citation.as_str()) {
                warn!(citation = %citation, "dropping citation that names no supplied passage");
                continue;
            }
            if !citations.contains(&citation) {
                citations.push(citation);
            }
        }

        let grounding = if citations.is_empty() {
            Grounding::Uncited
        } else {
            Grounding::Cited
        };

        Ok(Answer {
            text: raw.answer,
            citations,
            grounding,
        })
    }

    /// Answer an overview question, optionally grounded on a rendered corpus
    /// inventory. Overview answers never carry citations.
    pub async fn generate_overview(
        &self,
        question: &Question,
        inventory: Option<&str>,
    ) -> Result<Answer> {
        let mut prompt = String::from(ANSWER_PROMPT);
        prompt.push_str("\n\n");
        if let Some(inventory) = inventory {
            prompt.push_str("Files in the knowledge base:\n");
            prompt.push_str(inventory);
            prompt.push_str("\n\n---\n\n");
        }
        prompt.push_str(&format!("Question: {question}"));

        let raw = self.invoke(&prompt).await?;

        Ok(Answer {
            text: raw.answer,
            citations: Vec::new(),
            grounding: Grounding::Uncited,
        })
    }
}
