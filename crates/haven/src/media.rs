//! Image hosting through an external HTTP upload API.
//!
//! Uploads go to an unsigned-preset endpoint and return a stable
//! retrieval URL. Deletion requires privileged server-side credentials
//! the client does not hold, so the client-side delete only logs the
//! public id it would target.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::config::MediaConfig;

/// A stored image as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedImage {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("image host rejected the upload: {0}")]
    Rejected(String),
    #[error("image host transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upload succeeded but no URL was returned")]
    MissingUrl,
}

/// Abstract image-host contract.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Stores one image under the given folder label and returns its
    /// retrieval URL.
    async fn upload(&self, image: Vec<u8>, folder: &str) -> Result<HostedImage, MediaError>;
    /// Client-side delete stub; see module docs.
    async fn delete(&self, url: &str) -> Result<(), MediaError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    public_id: Option<String>,
}

/// Image host speaking the unsigned-preset upload protocol.
pub struct HttpImageHost {
    client: reqwest::Client,
    upload_url: String,
    upload_preset: String,
}

impl HttpImageHost {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url: config.upload_url.clone(),
            upload_preset: config.upload_preset.clone(),
        }
    }
}

#[async_trait]
impl ImageHost for HttpImageHost {
    async fn upload(&self, image: Vec<u8>, folder: &str) -> Result<HostedImage, MediaError> {
        let file = reqwest::multipart::Part::bytes(image)
            .file_name("upload.jpg")
            .mime_str(mime::IMAGE_JPEG.as_ref())?;
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", folder.to_string());

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected(detail));
        }

        let payload: UploadResponse = response.json().await?;
        let url = payload.secure_url.ok_or(MediaError::MissingUrl)?;
        let public_id = payload
            .public_id
            .or_else(|| public_id_from_url(&url))
            .unwrap_or_default();

        Ok(HostedImage { url, public_id })
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        // Deleting needs the host's signed API, which is server-side only.
        warn!(
            public_id = public_id_from_url(url).as_deref().unwrap_or("unknown"),
            "image delete requested; requires server-side credentials, skipping"
        );
        Ok(())
    }
}

/// Extracts the host's public id from a retrieval URL of the form
/// `…/upload/<version>/<public_id>.<format>`.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let parts: Vec<&str> = url.split('/').collect();
    let upload_index = parts.iter().position(|part| *part == "upload")?;
    let tail = parts.get(upload_index + 2..)?;
    if tail.is_empty() {
        return None;
    }
    let joined = tail.join("/");
    let trimmed = match joined.rfind('.') {
        Some(dot) if dot > joined.rfind('/').map_or(0, |slash| slash) => &joined[..dot],
        _ => &joined,
    };
    Some(trimmed.to_string())
}
