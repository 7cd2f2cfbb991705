//! Passage retrieval against the managed corpus

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use corq_core::{Error, Passage, PassageRetriever, Result, RetrievalQuery, RetryConfig};
use corq_vertex::{VertexConfig, resolve_access_token};

/// Retriever backed by the managed RAG service's `retrieveContexts` call.
/// Performs a network round-trip per query; no local state is mutated.
pub struct VertexRetriever {
    gcp: VertexConfig,
    retry: RetryConfig,
    access_token: Option<String>,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveRequest {
    vertex_rag_store: RagStore,
    query: RetrieveQuery,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RagStore {
    rag_resources: Vec<RagResource>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RagResource {
    rag_corpus: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveQuery {
    text: String,
    rag_retrieval_config: RagRetrievalConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RagRetrievalConfig {
    top_k: usize,
}

#[derive(Deserialize)]
struct RetrieveResponse {
    contexts: Option<ContextList>,
}

#[derive(Deserialize)]
struct ContextList {
    #[serde(default)]
    contexts: Vec<RetrievedContext>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrievedContext {
    source_uri: Option<String>,
    source_display_name: Option<String>,
    text: Option<String>,
    score: Option<f32>,
}

impl VertexRetriever {
    /// Create a new retriever from shared Vertex AI configuration
    pub fn new(gcp: VertexConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            gcp,
            retry: RetryConfig::default(),
            access_token: None,
            client,
        })
    }

    /// Override the retry policy for transient failures
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Resolve credentials for retrieval requests
    pub async fn connect(&mut self) -> Result<()> {
        let token = resolve_access_token(self.gcp.credentials_path.as_deref()).await?;
        self.access_token = Some(token);
        Ok(())
    }

    fn endpoint(&self) -> String {
        self.gcp
            .rag_endpoint(&format!("{}:retrieveContexts", self.gcp.location_path()))
    }

    /// One request attempt. The bool is whether a failure is retryable.
    async fn send_once(
        &self,
        url: &str,
        body: &RetrieveRequest,
        token: &str,
    ) -> std::result::Result<RetrieveResponse, (bool, Error)> {
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| (true, Error::Retrieval(format!("request failed: {e}"))))?;

        let status = response.status();
        if !status.is_success() {
            let retryable = status.as_u16() == 429 || status.is_server_error();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            let error = match status.as_u16() {
                401 | 403 => Error::Authentication(format!(
                    "retrieval request rejected with status {status}: {error_text}"
                )),
                _ => Error::Retrieval(format!(
                    "retrieval request failed with status {status}: {error_text}"
                )),
            };
            return Err((retryable, error));
        }

        response
            .json()
            .await
            .map_err(|e| (false, Error::Retrieval(format!("malformed response: {e}"))))
    }

    /// Flatten, sort by descending score, and cap at `top_k`.
    fn passages_from_response(response: RetrieveResponse, top_k: usize) -> Vec<Passage> {
        let contexts = match response.contexts {
            Some(list) => list.contexts,
            None => return Vec::new(),
        };

        let mut passages: Vec<Passage> = contexts
            .into_iter()
            .filter_map(|ctx| {
                let text = ctx.text?;
                let source_id = ctx
                    .source_display_name
                    .or(ctx.source_uri)
                    .unwrap_or_else(|| "unknown".to_string());
                Some(Passage {
                    source_id,
                    text,
                    score: ctx.score.unwrap_or(0.0),
                })
            })
            .collect();

        passages.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
        });
        passages.truncate(top_k);
        passages
    }
}

#[async_trait]
impl PassageRetriever for VertexRetriever {
    async fn retrieve(&self, query: &RetrievalQuery) -> Result<Vec<Passage>> {
        let token = self.access_token.as_ref().ok_or_else(|| {
            Error::Authentication("Not authenticated. Call connect() first.".to_string())
        })?;

        let url = self.endpoint();
        let body = RetrieveRequest {
            vertex_rag_store: RagStore {
                rag_resources: vec![RagResource {
                    rag_corpus: query.corpus.as_str().to_string(),
                }],
            },
            query: RetrieveQuery {
                text: query.text.clone(),
                rag_retrieval_config: RagRetrievalConfig {
                    top_k: query.top_k,
                },
            },
        };

        let mut delay = self.retry.base_delay;
        let mut attempt = 1;
        let response = loop {
            match self.send_once(&url, &body, token).await {
                Ok(response) => break response,
                Err((retryable, error)) if retryable && attempt < self.retry.max_attempts => {
                    warn!(attempt, %error, "transient retrieval failure, retrying");
                    sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err((_, error)) => return Err(error),
            }
        };

        Ok(Self::passages_from_response(response, query.top_k))
    }
}
