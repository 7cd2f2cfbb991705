//! Question classification

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use corq_core::{Error, GenerationConfig, LanguageModel, Question, QuestionKind, Result};

const CLASSIFY_PROMPT: &str = "Analyze the user's question and determine its type:\n\
1. 'corpus_overview' - if asking about all files, listing files, or a general overview of the knowledge base\n\
2. 'specific_query' - if asking a specific question that needs to be answered from particular file(s)\n\n\
Respond with ONLY 'corpus_overview' or 'specific_query'.";

fn label_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "question_type": {
                "type": "string",
                "enum": [QuestionKind::OVERVIEW_LABEL, QuestionKind::SPECIFIC_LABEL],
            }
        },
        "required": ["question_type"],
    })
}

/// Classifies a question with a single model invocation constrained to the
/// two known labels.
pub struct QuestionClassifier<M: LanguageModel> {
    model: Arc<M>,
    config: GenerationConfig,
}

#[derive(Deserialize)]
struct LabelResponse {
    question_type: Option<String>,
}

impl<M: LanguageModel> QuestionClassifier<M> {
    pub fn new(model: Arc<M>, config: GenerationConfig) -> Self {
        Self { model, config }
    }

    /// Classify a question. Output that cannot be parsed into one of the two
    /// labels is a `Classification` error; the pipeline decides the fallback.
    pub async fn classify(&self, question: &Question) -> Result<QuestionKind> {
        let prompt = format!("{CLASSIFY_PROMPT}\n\nQuestion: {question}");
        let schema = label_schema();

        let value = match self
            .model
            .generate_structured(&prompt, &schema, &self.config)
            .await
        {
            Ok(value) => value,
            // The model answered but not in the constrained shape.
            Err(Error::SchemaValidation(msg)) => return Err(Error::Classification(msg)),
            Err(e) => return Err(e),
        };

        let label: LabelResponse = serde_json::from_value(value)
            .map_err(|e| Error::Classification(format!("unexpected classifier output: {e}")))?;

        let raw = label
            .question_type
            .ok_or_else(|| Error::Classification("classifier returned no label".to_string()))?;

        QuestionKind::parse_label(&raw)
            .ok_or_else(|| Error::Classification(format!("unrecognized label: {raw}")))
    }
}
