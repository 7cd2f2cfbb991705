//! Vertex AI Gemini client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::warn;

use corq_core::{
    Error, GenerationConfig, GenerationResult, LanguageModel, PromptPart, Result, RetryConfig,
};

use crate::auth::resolve_access_token;
use crate::config::VertexConfig;

/// Vertex AI Gemini client
pub struct GeminiClient {
    config: VertexConfig,
    retry: RetryConfig,
    access_token: Option<String>,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: WireGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    candidates_token_count: Option<u32>,
}

/// A request failure plus whether it is worth retrying.
struct RequestFailure {
    retryable: bool,
    error: Error,
}

impl GeminiClient {
    /// Create a new Gemini client from configuration
    pub fn new(config: VertexConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            config,
            retry: RetryConfig::default(),
            access_token: None,
            client,
        })
    }

    /// Create a new Gemini client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = VertexConfig::from_env()?;
        Self::new(config)
    }

    /// Override the retry policy for transient failures
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Generation defaults derived from this client's configuration
    pub fn generation_config(&self) -> GenerationConfig {
        self.config.generation_config()
    }

    fn build_request(
        &self,
        parts: &[PromptPart],
        config: &GenerationConfig,
        schema: Option<&serde_json::Value>,
    ) -> GenerateRequest {
        let wire_parts = parts
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => Part {
                    text: Some(text.clone()),
                    inline_data: None,
                },
                PromptPart::InlineData { mime_type, data } => Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: mime_type.clone(),
                        data: data.clone(),
                    }),
                },
            })
            .collect();

        GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: wire_parts,
            }],
            generation_config: WireGenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_tokens,
                top_p: config.top_p,
                stop_sequences: config.stop_sequences.clone(),
                response_mime_type: schema.map(|_| "application/json".to_string()),
                response_schema: schema.cloned(),
            },
        }
    }

    async fn send_request(
        &self,
        url: &str,
        body: &GenerateRequest,
        token: &str,
    ) -> std::result::Result<GenerateResponse, RequestFailure> {
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| RequestFailure {
                retryable: true,
                error: Error::Network(e.to_string()),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retryable = status.as_u16() == 429 || status.is_server_error();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            let error = match status.as_u16() {
                401 | 403 => Error::Authentication(format!(
                    "Vertex AI request rejected with status {status}: {error_text}"
                )),
                _ => Error::Model(format!(
                    "Vertex AI request failed with status {status}: {error_text}"
                )),
            };
            return Err(RequestFailure { retryable, error });
        }

        response.json().await.map_err(|e| RequestFailure {
            retryable: false,
            error: Error::Serialization(e.to_string()),
        })
    }

    /// Perform a generation request with bounded retry on transient failures.
    async fn perform_generation(
        &self,
        parts: &[PromptPart],
        config: &GenerationConfig,
        schema: Option<&serde_json::Value>,
    ) -> Result<GenerateResponse> {
        let token = self.access_token.as_ref().ok_or_else(|| {
            Error::Authentication("Not authenticated. Call connect() first.".to_string())
        })?;

        let url = self.config.model_endpoint(&config.model_id, "generateContent");
        let body = self.build_request(parts, config, schema);

        let mut delay = self.retry.base_delay;
        let mut attempt = 1;
        loop {
            match self.send_request(&url, &body, token).await {
                Ok(response) => return Ok(response),
                Err(failure) if failure.retryable && attempt < self.retry.max_attempts => {
                    warn!(attempt, error = %failure.error, "transient Vertex AI failure, retrying");
                    sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    fn extract_text(response: GenerateResponse) -> Result<(String, Option<u32>)> {
        let tokens_used = response
            .usage_metadata
            .and_then(|usage| usage.candidates_token_count);

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::Model("no candidates in Vertex AI response".to_string()))?;

        let finish_reason = candidate.finish_reason.clone();
        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::Model(format!(
                "empty response from Vertex AI (finish reason: {})",
                finish_reason.unwrap_or_else(|| "unknown".to_string())
            )));
        }

        Ok((text, tokens_used))
    }

    async fn generate_inner(
        &self,
        parts: &[PromptPart],
        config: &GenerationConfig,
        schema: Option<&serde_json::Value>,
    ) -> Result<GenerationResult> {
        let generation_future = self.perform_generation(parts, config, schema);

        let response = match timeout(config.timeout, generation_future).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::Timeout("generation request timed out".to_string())),
        };

        let (text, tokens_used) = Self::extract_text(response)?;

        Ok(GenerationResult {
            text,
            model_id: config.model_id.clone(),
            tokens_used,
        })
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn connect(&mut self) -> Result<()> {
        let token = resolve_access_token(self.config.credentials_path.as_deref()).await?;
        self.access_token = Some(token);
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        let config = self.generation_config();
        self.generate_with_config(prompt, &config).await
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let parts = [PromptPart::Text(prompt.to_string())];
        self.generate_inner(&parts, config, None).await
    }

    async fn generate_parts(
        &self,
        parts: &[PromptPart],
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        self.generate_inner(parts, config, None).await
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
        config: &GenerationConfig,
    ) -> Result<serde_json::Value> {
        let parts = [PromptPart::Text(prompt.to_string())];
        let result = self.generate_inner(&parts, config, Some(schema)).await?;

        serde_json::from_str(&result.text).map_err(|e| {
            Error::SchemaValidation(format!("model did not return valid JSON: {e}"))
        })
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GeminiClient {
        GeminiClient::new(VertexConfig::new("test-project", "us-central1")).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let client = test_client();
        let config = GenerationConfig {
            temperature: Some(0.25),
            max_tokens: 256,
            ..client.generation_config()
        };
        let parts = [PromptPart::Text("What is in the corpus?".to_string())];
        let request = client.build_request(&parts, &config, None);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(
            value["contents"][0]["parts"][0]["text"],
            "What is in the corpus?"
        );
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 256);
        assert_eq!(value["generationConfig"]["temperature"], 0.25);
        // no schema requested, so no structured-output fields on the wire
        assert!(value["generationConfig"].get("responseMimeType").is_none());
        assert!(value["generationConfig"].get("responseSchema").is_none());
        assert!(value["generationConfig"].get("stopSequences").is_none());
    }

    #[test]
    fn test_request_body_with_schema_forces_json() {
        let client = test_client();
        let config = client.generation_config();
        let schema = serde_json::json!({
            "type": "object",
            "properties": {"answer": {"type": "string"}},
            "required": ["answer"],
        });
        let parts = [PromptPart::Text("hello".to_string())];
        let request = client.build_request(&parts, &config, Some(&schema));

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            value["generationConfig"]["responseSchema"]["required"][0],
            "answer"
        );
    }

    #[test]
    fn test_inline_data_part_serializes_as_inline_data() {
        let client = test_client();
        let config = client.generation_config();
        let parts = [
            PromptPart::Text("What does this report say?".to_string()),
            PromptPart::InlineData {
                mime_type: "application/pdf".to_string(),
                data: "JVBERi0=".to_string(),
            },
        ];
        let request = client.build_request(&parts, &config, None);

        let value = serde_json::to_value(&request).unwrap();
        let wire_parts = value["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(wire_parts.len(), 2);
        assert_eq!(wire_parts[1]["inlineData"]["mimeType"], "application/pdf");
        assert_eq!(wire_parts[1]["inlineData"]["data"], "JVBERi0=");
    }

    #[test]
    fn test_extract_text_concatenates_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Hello "}, {"text": "world"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"candidatesTokenCount": 12}
            }"#,
        )
        .unwrap();

        let (text, tokens) = GeminiClient::extract_text(response).unwrap();
        assert_eq!(text, "Hello world");
        assert_eq!(tokens, Some(12));
    }

    #[test]
    fn test_extract_text_reports_empty_candidates() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        let err = GeminiClient::extract_text(response).unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }

    #[test]
    fn test_extract_text_reports_finish_reason_when_blocked() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"finishReason": "SAFETY"}]}"#,
        )
        .unwrap();

        let err = GeminiClient::extract_text(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_model_endpoint() {
        let client = test_client();
        assert_eq!(
            client.config.model_endpoint("gemini-2.5-flash", "generateContent"),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/test-project/locations/us-central1/publishers/google/models/gemini-2.5-flash:generateContent"
        );
    }
}
