//! Batch file upload orchestration.
//!
//! Each call moves through `Validating -> Uploading -> Persisting -> Done`:
//! every accepted file is written to the blob store first, then the files
//! that made it are recorded. Whole-call failures (bad credential, too many files) end in `Failed`
//! before anything is written anywhere. Past that point every file is on its
//! own: one file failing never aborts or rolls back its siblings.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::domain::{
    AuditAction, AuditEvent, AuditOutcome, FailureReason, FileDescriptor, FileFailure, FileUpload,
    Identity, UploadOutcome, UploadedFileRecord,
};
use crate::error::{GatewayError, GatewayResult};
use crate::ports::{AuditSink, BackingStore, BlobMetadata, BlobStore, IdentityVerifier};
use crate::validation::validate_file;

use super::{Caller, call_with_timeout, resolve_identity};

/// Stage of an upload call, reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Idle,
    Validating,
    Uploading,
    Persisting,
    Done,
    Failed,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Uploading => "uploading",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Maximum concurrent blob store writes per call.
    pub max_concurrency: usize,
    /// Deadline applied to every external call.
    pub call_timeout: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            call_timeout: Duration::from_secs(30),
        }
    }
}

pub struct UploadService {
    identity: Arc<dyn IdentityVerifier>,
    blobs: Arc<dyn BlobStore>,
    store: Arc<dyn BackingStore>,
    audit: Arc<dyn AuditSink>,
    settings: UploadSettings,
}

struct StageTracker {
    call_id: uuid::Uuid,
    stage: UploadStage,
    visited: Vec<UploadStage>,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            call_id: uuid::Uuid::new_v4(),
            stage: UploadStage::Idle,
            visited: Vec::with_capacity(4),
        }
    }

    fn advance(&mut self, next: UploadStage) {
        tracing::debug!(upload_id = %self.call_id, from = %self.stage, to = %next, "Upload stage");
        self.stage = next;
        self.visited.push(next);
    }
}

impl UploadService {
    pub fn new(
        identity: Arc<dyn IdentityVerifier>,
        blobs: Arc<dyn BlobStore>,
        store: Arc<dyn BackingStore>,
        audit: Arc<dyn AuditSink>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            identity,
            blobs,
            store,
            audit,
            settings,
        }
    }

    /// Upload a batch of files for the caller.
    ///
    /// Returns `Err` only when the whole batch is refused. Individual file
    /// failures are reported in [`UploadOutcome::failed`].
    pub async fn upload(
        &self,
        files: Vec<FileUpload>,
        caller: impl Into<Caller<'_>>,
        max_files: usize,
    ) -> GatewayResult<UploadOutcome> {
        self.run(&mut StageTracker::new(), files, caller.into(), max_files).await
    }

    async fn run(
        &self,
        tracker: &mut StageTracker,
        files: Vec<FileUpload>,
        caller: Caller<'_>,
        max_files: usize,
    ) -> GatewayResult<UploadOutcome> {
        let timeout = self.settings.call_timeout;

        let identity = match resolve_identity(self.identity.as_ref(), caller, timeout).await
        {
            Ok(identity) => identity,
            Err(e) => {
                tracker.advance(UploadStage::Failed);
                return Err(e);
            }
        };

        tracker.advance(UploadStage::Validating);
        if let Err(e) = self.check_batch_size(&identity, files.len(), max_files).await {
            tracker.advance(UploadStage::Failed);
            return Err(e);
        }

        let mut outcome = UploadOutcome::default();
        let mut accepted = Vec::with_capacity(files.len());
        for file in files {
            let result = validate_file(file.size(), &file.mime_type);
            if result.is_valid {
                accepted.push(file);
            } else {
                outcome.failed.push(FileFailure {
                    file: file.name,
                    reason: FailureReason::Invalid {
                        errors: result.errors,
                    },
                });
            }
        }

        tracker.advance(UploadStage::Uploading);
        let concurrency = self.settings.max_concurrency.max(1);
        let uploaded: Vec<Result<FileDescriptor, FileFailure>> = stream::iter(accepted)
            .map(|file| self.put_one(&identity, file))
            .buffered(concurrency)
            .collect()
            .await;

        let mut descriptors = Vec::with_capacity(uploaded.len());
        for result in uploaded {
            match result {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(failure) => outcome.failed.push(failure),
            }
        }

        tracker.advance(UploadStage::Persisting);
        let recorded: Vec<Result<FileDescriptor, FileFailure>> = stream::iter(descriptors)
            .map(|descriptor| self.record_one(&identity, descriptor))
            .buffered(concurrency)
            .collect()
            .await;

        for result in recorded {
            match result {
                Ok(descriptor) => outcome.succeeded.push(descriptor),
                Err(failure) => outcome.failed.push(failure),
            }
        }

        tracker.advance(UploadStage::Done);
        tracing::info!(
            upload_id = %tracker.call_id,
            user_id = %identity.user_id,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            stages = ?tracker.visited,
            "Upload batch finished"
        );

        Ok(outcome)
    }

    /// Refuse the batch when it would push the caller past `max_files`.
    async fn check_batch_size(
        &self,
        identity: &Identity,
        attempted: usize,
        max_files: usize,
    ) -> GatewayResult<()> {
        // Oversized batches are refused without asking the store.
        let existing = if attempted > max_files {
            0
        } else {
            call_with_timeout(
                self.settings.call_timeout,
                self.store.count_uploaded_files(identity.user_id),
            )
            .await
            .map_err(|e| GatewayError::upstream("count_uploaded_files", e))?
        };

        if attempted as u64 + existing > max_files as u64 {
            self.audit.emit(
                AuditEvent::new(
                    AuditAction::FileUpload,
                    AuditOutcome::Rejected,
                    "check_batch_size",
                    "File limit exceeded",
                )
                .actor(identity.user_id)
                .with("attempted", attempted)
                .with("existing", existing)
                .with("max_files", max_files),
            );
            return Err(GatewayError::FileLimitExceeded {
                attempted,
                existing,
                max: max_files,
            });
        }

        Ok(())
    }

    /// Write one file to the blob store.
    async fn put_one(&self, identity: &Identity, file: FileUpload) -> Result<FileDescriptor, FileFailure> {
        let timeout = self.settings.call_timeout;
        let metadata = BlobMetadata {
            owner_id: identity.user_id,
            file_name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size(),
        };

        let stored = match call_with_timeout(timeout, self.blobs.put(file.bytes, &metadata)).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(
                    user_id = %identity.user_id,
                    file_name = %metadata.file_name,
                    error = %e,
                    "Blob upload failed"
                );
                self.audit.emit(
                    AuditEvent::new(
                        AuditAction::FileUpload,
                        AuditOutcome::UpstreamFailed,
                        "blob_put",
                        e.to_string(),
                    )
                    .actor(identity.user_id)
                    .with("file_name", &metadata.file_name),
                );
                return Err(FileFailure {
                    file: metadata.file_name,
                    reason: FailureReason::UploadFailed,
                });
            }
        };

        Ok(FileDescriptor {
            url: stored.url,
            name: metadata.file_name,
            key: stored.external_key,
            size: metadata.size,
            mime_type: metadata.mime_type,
        })
    }

    /// Record an uploaded file. A failure here leaves an orphaned blob.
    async fn record_one(
        &self,
        identity: &Identity,
        descriptor: FileDescriptor,
    ) -> Result<FileDescriptor, FileFailure> {
        let timeout = self.settings.call_timeout;
        let record = UploadedFileRecord::new(identity.user_id, &descriptor);
        let record_id = record.id;
        match call_with_timeout(timeout, self.store.insert_uploaded_file(record)).await {
            Ok(_) => {
                self.audit.emit(
                    AuditEvent::new(
                        AuditAction::FileUpload,
                        AuditOutcome::Succeeded,
                        "insert_uploaded_file",
                        "File stored",
                    )
                    .actor(identity.user_id)
                    .with("record_id", record_id)
                    .with("external_key", &descriptor.key),
                );
                Ok(descriptor)
            }
            Err(e) => {
                // The blob exists but nothing references it.
                self.audit.emit(
                    AuditEvent::new(
                        AuditAction::FileUpload,
                        AuditOutcome::NeedsReconciliation,
                        "insert_uploaded_file",
                        format!("Orphaned blob: {}", e),
                    )
                    .actor(identity.user_id)
                    .with("external_key", &descriptor.key)
                    .with("url", &descriptor.url)
                    .with("file_name", &descriptor.name)
                    .with("file_size", descriptor.size),
                );
                Err(FileFailure {
                    file: descriptor.name,
                    reason: FailureReason::NotSaved,
                })
            }
        }
    }
}
