//! Object storage client for evidence images.
//!
//! Performs an unsigned multipart upload (`file` + `upload_preset`) to a
//! Cloudinary-compatible endpoint and returns the `secure_url` of the hosted
//! image.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use wastewatch_core::{ImageUpload, ObjectStore, StorageError};

/// Default API base for hosted uploads.
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// API base URL (without the cloud name).
    pub api_base: String,
    /// Account ("cloud") name.
    pub cloud_name: String,
    /// Unsigned upload preset.
    pub upload_preset: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            cloud_name: "dyj3rywju".to_string(),
            upload_preset: "sample".to_string(),
        }
    }
}

impl StorageConfig {
    /// Full image upload endpoint.
    #[must_use]
    pub fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.api_base.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

/// Subset of the upload response we rely on.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

/// Hosted image store.
#[derive(Debug, Clone)]
pub struct CloudinaryStore {
    client: Client,
    config: StorageConfig,
}

impl CloudinaryStore {
    /// Create a store with a fresh HTTP client.
    #[must_use]
    pub fn new(config: StorageConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Create a store sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: Client, config: StorageConfig) -> Self {
        Self { client, config }
    }

    fn build_form(&self, image: &ImageUpload) -> Result<Form, StorageError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| StorageError::Transport(format!("mime error: {e}")))?;

        Ok(Form::new()
            .part("file", part)
            .text("upload_preset", self.config.upload_preset.clone()))
    }
}

#[async_trait]
impl ObjectStore for CloudinaryStore {
    async fn upload(&self, image: &ImageUpload) -> Result<String, StorageError> {
        let url = self.config.upload_url();
        tracing::debug!(
            endpoint = %url,
            file = %image.file_name,
            bytes = image.bytes.len(),
            "uploading image"
        );

        let response = self
            .client
            .post(&url)
            .multipart(self.build_form(image)?)
            .send()
            .await
            .map_err(StorageError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadResponse = response.json().await.map_err(StorageError::transport)?;
        match parsed.secure_url {
            Some(url) if !url.is_empty() => {
                tracing::debug!(url = %url, "image hosted");
                Ok(url)
            }
            _ => Err(StorageError::MissingUrl),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
