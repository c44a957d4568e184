//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// POST /api/posts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    /// Sanitized body as stored.
    pub content: String,
    pub created_at: String,
}

/// One file in an upload batch. The body travels base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFilePayload {
    pub name: String,
    pub mime_type: String,
    pub data_base64: String,
}

/// POST /api/uploads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub files: Vec<UploadFilePayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFileResponse {
    pub url: String,
    pub name: String,
    pub key: String,
    pub size: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedFileResponse {
    pub file: String,
    /// `invalid`, `upload_failed` or `not_saved`.
    pub reason: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    pub succeeded: Vec<StoredFileResponse>,
    pub failed: Vec<FailedFileResponse>,
}

/// POST /api/boosts/checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub target_post_id: Uuid,
    pub boost_type: String,
    pub duration_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub redirect_url: String,
    pub boost_id: Uuid,
}

/// POST /api/validation/password
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordCheckRequest {
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// POST /api/validation/content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentCheckRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentCheckResponse {
    pub is_safe: bool,
    pub sanitized: String,
}
