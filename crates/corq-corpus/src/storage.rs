//! Object storage upload

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use corq_core::{Error, Result, StorageUri, mime_type_for};
use corq_vertex::resolve_access_token;

const UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";

/// Client for uploading local files to a Cloud Storage bucket.
pub struct StorageClient {
    credentials_path: Option<String>,
    access_token: Option<String>,
    client: Client,
}

impl StorageClient {
    pub fn new(credentials_path: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            credentials_path,
            access_token: None,
            client,
        })
    }

    /// Resolve credentials for upload requests
    pub async fn connect(&mut self) -> Result<()> {
        let token = resolve_access_token(self.credentials_path.as_deref()).await?;
        self.access_token = Some(token);
        Ok(())
    }

    /// Upload a local file into the bucket under `object`, returning the
    /// `gs://` URI of the stored object.
    pub async fn upload_object(
        &self,
        local_path: &Path,
        bucket: &str,
        object: &str,
    ) -> Result<StorageUri> {
        let token = self.access_token.as_ref().ok_or_else(|| {
            Error::Authentication("Not authenticated. Call connect() first.".to_string())
        })?;

        let bytes = tokio::fs::read(local_path).await.map_err(|e| {
            Error::Upload(format!("failed to read {}: {e}", local_path.display()))
        })?;

        let bucket_name = bucket.trim_start_matches("gs://").trim_end_matches('/');
        let url = format!("{UPLOAD_BASE}/b/{bucket_name}/o");

        let response = self
            .client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", object)])
            .bearer_auth(token)
            .header(CONTENT_TYPE, mime_type_for(local_path))
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            let error = match status.as_u16() {
                401 | 403 => Error::Authentication(format!(
                    "upload rejected with status {status}: {error_text}"
                )),
                _ => Error::Upload(format!(
                    "upload failed with status {status}: {error_text}"
                )),
            };
            return Err(error);
        }

        let uri = StorageUri::new(bucket_name, object);
        info!(uri = %uri, "uploaded object");
        Ok(uri)
    }
}
