use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest accepted upload, in bytes (10 MiB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// MIME types accepted for upload.
pub const ALLOWED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// A file submitted by a caller, not yet validated or stored.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

// Payloads can be megabytes; keep them out of logs.
impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size())
            .finish()
    }
}

/// A file that was stored externally and recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub url: String,
    pub name: String,
    pub key: String,
    pub size: u64,
    pub mime_type: String,
}

/// Persisted metadata row for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFileRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub file_size: u64,
    pub file_type: String,
    pub external_key: String,
    pub created_at: DateTime<Utc>,
}

impl UploadedFileRecord {
    pub fn new(owner_id: Uuid, descriptor: &FileDescriptor) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            file_name: descriptor.name.clone(),
            file_url: descriptor.url.clone(),
            file_size: descriptor.size,
            file_type: descriptor.mime_type.clone(),
            external_key: descriptor.key.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Why a single file in a batch did not make it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Rejected by validation before any upload was attempted.
    Invalid { errors: Vec<String> },
    /// The blob store refused or timed out.
    UploadFailed,
    /// Stored externally but the metadata row could not be written.
    NotSaved,
}

impl FailureReason {
    pub fn message(&self) -> String {
        match self {
            Self::Invalid { errors } => errors.join(", "),
            Self::UploadFailed => "Upload failed".to_string(),
            Self::NotSaved => "File could not be saved".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub file: String,
    pub reason: FailureReason,
}

/// Result of a batch upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub succeeded: Vec<FileDescriptor>,
    pub failed: Vec<FileFailure>,
}
