//! Access token resolution for Google Cloud APIs
//!
//! Token minting is owned by the ambient credentials: an explicit
//! `GCP_ACCESS_TOKEN` wins, otherwise the gcloud application-default flow is
//! asked for one. A configured credential path is passed through to the
//! subprocess so `GOOGLE_APPLICATION_CREDENTIALS` behaves the same as it
//! does for the provider SDKs.

use tokio::process::Command;

use corq_core::{Error, Result};

/// Resolve a bearer token for Vertex AI and Cloud Storage requests.
pub async fn resolve_access_token(credentials_path: Option<&str>) -> Result<String> {
    if let Ok(token) = std::env::var("GCP_ACCESS_TOKEN") {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }

    let mut cmd = Command::new("gcloud");
    cmd.args(["auth", "application-default", "print-access-token"]);
    if let Some(path) = credentials_path {
        cmd.env("GOOGLE_APPLICATION_CREDENTIALS", path);
    }

    let output = cmd.output().await.map_err(|e| {
        Error::Authentication(format!(
            "failed to run gcloud for an access token (set GCP_ACCESS_TOKEN to skip it): {e}"
        ))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Authentication(format!(
            "gcloud auth application-default print-access-token failed: {}",
            stderr.trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::Authentication(
            "gcloud returned an empty access token".to_string(),
        ));
    }

    Ok(token)
}
