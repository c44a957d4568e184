//! HTTP object storage client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use gateway_core::ports::{BlobMetadata, BlobStore, BlobStoreError, StoredBlob};

use super::object_key;

#[derive(Debug, Clone)]
pub struct HttpBlobStoreConfig {
    /// Storage API base, e.g. `https://storage.example.com/v1/buckets/uploads`.
    pub base_url: String,
    /// Service credential sent as a bearer token.
    pub token: String,
    /// Public base URL objects are served from.
    pub public_base_url: String,
    pub request_timeout: Duration,
}

impl HttpBlobStoreConfig {
    /// `None` when `BLOB_STORE_URL` is unset.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("BLOB_STORE_URL").ok().filter(|u| !u.is_empty())?;
        let public_base_url =
            std::env::var("BLOB_PUBLIC_BASE_URL").unwrap_or_else(|_| base_url.clone());
        Some(Self {
            token: std::env::var("BLOB_STORE_TOKEN").unwrap_or_default(),
            base_url,
            public_base_url,
            request_timeout: Duration::from_secs(60),
        })
    }
}

fn join(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

pub struct HttpBlobStore {
    client: reqwest::Client,
    config: HttpBlobStoreConfig,
}

impl HttpBlobStore {
    pub fn new(config: HttpBlobStoreConfig) -> Result<Self, BlobStoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BlobStoreError::Connection(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, bytes: Vec<u8>, metadata: &BlobMetadata) -> Result<StoredBlob, BlobStoreError> {
        let key = object_key(metadata.owner_id, &metadata.file_name);

        let response = self
            .client
            .put(join(&self.config.base_url, &key))
            .bearer_auth(&self.config.token)
            .header(reqwest::header::CONTENT_TYPE, &metadata.mime_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| BlobStoreError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::BAD_REQUEST
                | StatusCode::PAYLOAD_TOO_LARGE
                | StatusCode::UNSUPPORTED_MEDIA_TYPE
                | StatusCode::FORBIDDEN
                | StatusCode::CONFLICT => BlobStoreError::Rejected(format!("{}: {}", status, body)),
                _ => BlobStoreError::Protocol(format!("{}: {}", status, body)),
            });
        }

        tracing::debug!(key = %key, size = metadata.size, "Blob stored");
        Ok(StoredBlob {
            url: join(&self.config.public_base_url, &key),
            external_key: key,
        })
    }
}
