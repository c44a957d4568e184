//! Domain entities - the values produced and persisted by the gateway.

mod audit;
mod boost;
mod file;
mod identity;
mod post;

pub use audit::{AuditAction, AuditEvent, AuditOutcome};
pub use boost::{BoostRecord, BoostStatus, BoostTier, CheckoutRedirect};
pub use file::{
    ALLOWED_MIME_TYPES, FailureReason, FileDescriptor, FileFailure, FileUpload, MAX_FILE_SIZE,
    UploadOutcome, UploadedFileRecord,
};
pub use identity::Identity;
pub use post::Post;
