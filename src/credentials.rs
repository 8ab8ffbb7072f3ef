use crate::error::{credential_error, SyncResult};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Where the service-account credential blob is fetched from at run start.
///
/// The blob is opaque to everything downstream of [`fetch_blob`]; the rest of
/// the job treats it as the contents of a credentials file.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Remote object-store location, e.g. a presigned bucket URL
    Url(String),
    /// Local file path, mainly for development runs
    File(PathBuf),
}

/// Fetch the credential blob before anything else runs.
pub async fn fetch_blob(client: &reqwest::Client, source: &CredentialSource) -> SyncResult<String> {
    match source {
        CredentialSource::Url(url) => {
            info!("Fetching credentials from object store");
            let response = client
                .get(url)
                .send()
                .await
                .map_err(|e| credential_error(&format!("Failed to fetch credentials: {}", e)))?;

            if !response.status().is_success() {
                return Err(credential_error(&format!(
                    "Failed to fetch credentials: HTTP {}",
                    response.status()
                )));
            }

            response
                .text()
                .await
                .map_err(|e| credential_error(&format!("Failed to read credentials body: {}", e)))
        }
        CredentialSource::File(path) => {
            info!("Reading credentials from {}", path.display());
            fs::read_to_string(path).map_err(|e| {
                credential_error(&format!(
                    "Failed to read credentials from {}: {}",
                    path.display(),
                    e
                ))
            })
        }
    }
}
