//! Corpus administration: create, import, list

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use corq_core::{
    CorpusCatalog, CorpusFile, CorpusName, Error, ImportOutcome, Result, StorageUri,
};
use corq_vertex::{VertexConfig, resolve_access_token};

use crate::config::ChunkingConfig;

/// Client for the corpus management surface. Creation and import return as
/// soon as the service accepts the request; indexing completes
/// asynchronously and the corpus must not be assumed queryable immediately.
pub struct CorpusAdmin {
    gcp: VertexConfig,
    access_token: Option<String>,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCorpusRequest {
    display_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportRequest {
    import_rag_files_config: ImportConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportConfig {
    gcs_source: GcsSource,
    rag_file_transformation_config: TransformationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GcsSource {
    uris: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransformationConfig {
    rag_file_chunking_config: WireChunkingConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireChunkingConfig {
    fixed_length_chunking: FixedLengthChunking,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FixedLengthChunking {
    chunk_size: u32,
    chunk_overlap: u32,
}

#[derive(Deserialize)]
struct OperationResponse {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFilesResponse {
    #[serde(default)]
    rag_files: Vec<WireRagFile>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRagFile {
    name: String,
    #[serde(default)]
    display_name: String,
    gcs_source: Option<WireGcsSource>,
    file_status: Option<WireFileStatus>,
    create_time: Option<DateTime<Utc>>,
    update_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct WireGcsSource {
    #[serde(default)]
    uris: Vec<String>,
}

#[derive(Deserialize)]
struct WireFileStatus {
    state: Option<String>,
}

impl CorpusAdmin {
    /// Create a new admin client from shared Vertex AI configuration
    pub fn new(gcp: VertexConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            gcp,
            access_token: None,
            client,
        })
    }

    /// Resolve credentials for admin requests
    pub async fn connect(&mut self) -> Result<()> {
        let token = resolve_access_token(self.gcp.credentials_path.as_deref()).await?;
        self.access_token = Some(token);
        Ok(())
    }

    fn token(&self) -> Result<&str> {
        self.access_token.as_deref().ok_or_else(|| {
            Error::Authentication("Not authenticated. Call connect() first.".to_string())
        })
    }

    async fn read_failure(response: reqwest::Response, kind: fn(String) -> Error) -> Error {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        match status.as_u16() {
            401 | 403 => Error::Authentication(format!(
                "request rejected with status {status}: {error_text}"
            )),
            _ => kind(format!("request failed with status {status}: {error_text}")),
        }
    }

    /// Create a corpus with the given display name, returning its fully
    /// qualified resource name.
    pub async fn create_corpus(&self, display_name: &str) -> Result<CorpusName> {
        let token = self.token()?;
        let url = self
            .gcp
            .rag_endpoint(&format!("{}/ragCorpora", self.gcp.location_path()));
        let body = CreateCorpusRequest {
            display_name: display_name.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::read_failure(response, Error::Import).await);
        }

        let operation: OperationResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        // The operation name embeds the corpus resource name:
        // projects/{p}/locations/{l}/ragCorpora/{id}/operations/{op}
        let corpus = operation
            .name
            .split("/operations/")
            .next()
            .filter(|prefix| prefix.contains("/ragCorpora/"))
            .ok_or_else(|| {
                Error::Import(format!(
                    "create corpus returned an unexpected operation name: {}",
                    operation.name
                ))
            })?;

        let corpus = CorpusName::new(corpus);
        info!(corpus = %corpus, "created corpus");
        Ok(corpus)
    }

    /// Import an uploaded object into the corpus index. Returns once the
    /// import is accepted; the returned operation name identifies the
    /// asynchronous indexing work.
    pub async fn import_file(
        &self,
        corpus: &CorpusName,
        uri: &StorageUri,
        chunking: &ChunkingConfig,
    ) -> Result<ImportOutcome> {
        let token = self.token()?;
        let url = self
            .gcp
            .rag_endpoint(&format!("{}/ragFiles:import", corpus.as_str()));
        let body = ImportRequest {
            import_rag_files_config: ImportConfig {
                gcs_source: GcsSource {
                    uris: vec![uri.as_str().to_string()],
                },
                rag_file_transformation_config: TransformationConfig {
                    rag_file_chunking_config: WireChunkingConfig {
                        fixed_length_chunking: FixedLengthChunking {
                            chunk_size: chunking.chunk_size,
                            chunk_overlap: chunking.chunk_overlap,
                        },
                    },
                },
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::read_failure(response, Error::Import).await);
        }

        let operation: OperationResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        info!(operation = %operation.name, uri = %uri, "import accepted");
        Ok(ImportOutcome {
            operation: operation.name,
            accepted: true,
        })
    }

    async fn list_files_page(
        &self,
        corpus: &CorpusName,
        page_token: Option<&str>,
    ) -> Result<ListFilesResponse> {
        let token = self.token()?;
        let url = self
            .gcp
            .rag_endpoint(&format!("{}/ragFiles", corpus.as_str()));

        let mut request = self.client.get(&url).bearer_auth(token);
        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Retrieval(format!("list files request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::read_failure(response, Error::Retrieval).await);
        }

        response
            .json()
            .await
            .map_err(|e| Error::Retrieval(format!("malformed list response: {e}")))
    }

    fn corpus_file_from_wire(file: WireRagFile) -> CorpusFile {
        let uri = file
            .gcs_source
            .and_then(|source| source.uris.into_iter().next());
        let state = file
            .file_status
            .and_then(|status| status.state)
            .unwrap_or_else(|| "UNKNOWN".to_string());

        CorpusFile {
            display_name: file.display_name,
            resource_name: file.name,
            uri,
            state,
            create_time: file.create_time,
            update_time: file.update_time,
        }
    }
}

#[async_trait]
impl CorpusCatalog for CorpusAdmin {
    async fn list_files(&self, corpus: &CorpusName) -> Result<Vec<CorpusFile>> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_files_page(corpus, page_token.as_deref()).await?;
            files.extend(page.rag_files.into_iter().map(Self::corpus_file_from_wire));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(files)
    }
}
