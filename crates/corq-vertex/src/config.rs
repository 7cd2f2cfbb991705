//! Vertex AI configuration

use serde::{Deserialize, Serialize};
use std::env;

use corq_core::{Error, GenerationConfig, Result};

/// Configuration for Vertex AI clients: the model client, the retriever,
/// and the corpus admin all share the project/location/credential fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexConfig {
    pub project_id: String,
    pub location: String,
    pub model_id: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub credentials_path: Option<String>,
}

impl VertexConfig {
    /// Create configuration from environment variables. Fails fast on a
    /// missing project id or an unparseable number, before any network call.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let project_id = env::var("GCP_PROJECT_ID").map_err(|_| {
            Error::Configuration("GCP_PROJECT_ID environment variable not found".to_string())
        })?;

        let location = env::var("GCP_LOCATION").unwrap_or_else(|_| "us-central1".to_string());

        let model_id = env::var("VERTEX_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());

        let temperature = match env::var("VERTEX_TEMPERATURE") {
            Ok(raw) => raw.parse::<f32>().map_err(|_| {
                Error::Configuration(format!("VERTEX_TEMPERATURE is not a number: {raw}"))
            })?,
            Err(_) => 0.7,
        };

        let max_tokens = match env::var("VERTEX_MAX_TOKENS") {
            Ok(raw) => raw.parse::<u32>().map_err(|_| {
                Error::Configuration(format!("VERTEX_MAX_TOKENS is not an integer: {raw}"))
            })?,
            Err(_) => 8192,
        };

        let credentials_path = env::var("GOOGLE_APPLICATION_CREDENTIALS").ok();

        Ok(Self {
            project_id,
            location,
            model_id,
            temperature,
            max_tokens,
            credentials_path,
        })
    }

    /// Create configuration with explicit values and defaults elsewhere.
    pub fn new(project_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
            model_id: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
            max_tokens: 8192,
            credentials_path: None,
        }
    }

    /// Regional API host, e.g. `us-central1-aiplatform.googleapis.com`.
    pub fn api_host(&self) -> String {
        format!("{}-aiplatform.googleapis.com", self.location)
    }

    /// Endpoint for a publisher model method such as `generateContent`.
    pub fn model_endpoint(&self, model_id: &str, method: &str) -> String {
        format!(
            "https://{}/v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
            self.api_host(),
            self.project_id,
            self.location,
            model_id,
            method
        )
    }

    /// Endpoint for a RAG resource path under the v1beta1 surface, e.g.
    /// `projects/{p}/locations/{l}/ragCorpora` or a `:retrieveContexts` verb.
    pub fn rag_endpoint(&self, path: &str) -> String {
        format!("https://{}/v1beta1/{}", self.api_host(), path)
    }

    /// Location-scoped resource prefix, `projects/{p}/locations/{l}`.
    pub fn location_path(&self) -> String {
        format!("projects/{}/locations/{}", self.project_id, self.location)
    }

    /// Generation defaults carrying this configuration's model parameters.
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model_id: self.model_id.clone(),
            temperature: Some(self.temperature),
            max_tokens: self.max_tokens,
            ..Default::default()
        }
    }
}
