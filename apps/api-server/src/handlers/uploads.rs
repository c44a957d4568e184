use actix_web::{HttpRequest, HttpResponse, web};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gateway_core::domain::{FailureReason, FileFailure, FileUpload, UploadOutcome};
use gateway_core::services::ActionKind;
use gateway_shared::dto::{
    FailedFileResponse, StoredFileResponse, UploadFilePayload, UploadRequest, UploadResponse,
};

use crate::middleware::auth::{BearerToken, RequestCaller, identify};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn decode(payload: UploadFilePayload) -> Result<FileUpload, AppError> {
    let bytes = STANDARD
        .decode(payload.data_base64.as_bytes())
        .map_err(|e| AppError::BadRequest(format!("File '{}' is not valid base64: {}", payload.name, e)))?;
    Ok(FileUpload::new(payload.name, payload.mime_type, bytes))
}

fn failure_response(failure: FileFailure) -> FailedFileResponse {
    let message = failure.reason.message();
    let (reason, errors) = match failure.reason {
        FailureReason::Invalid { errors } => ("invalid", errors),
        FailureReason::UploadFailed => ("upload_failed", Vec::new()),
        FailureReason::NotSaved => ("not_saved", Vec::new()),
    };
    FailedFileResponse {
        file: failure.file,
        reason: reason.to_string(),
        message,
        errors,
    }
}

fn to_response(outcome: UploadOutcome) -> UploadResponse {
    UploadResponse {
        succeeded: outcome
            .succeeded
            .into_iter()
            .map(|file| StoredFileResponse {
                url: file.url,
                name: file.name,
                key: file.key,
                size: file.size,
                mime_type: file.mime_type,
            })
            .collect(),
        failed: outcome.failed.into_iter().map(failure_response).collect(),
    }
}

/// POST /api/uploads
///
/// Answers 200 even when some files failed; the per-file outcome is in the body.
pub async fn upload_files(
    req: HttpRequest,
    state: web::Data<AppState>,
    token: BearerToken,
    body: web::Json<UploadRequest>,
) -> AppResult<HttpResponse> {
    let RequestCaller { subject, caller } = identify(&state, &token, &req).await;
    state.guard.enforce(ActionKind::UploadFiles, &subject).await?;

    let files = body
        .into_inner()
        .files
        .into_iter()
        .map(decode)
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = state
        .uploads
        .upload(files, caller, state.upload_max_files)
        .await?;

    tracing::info!(
        succeeded = outcome.succeeded.len(),
        failed = outcome.failed.len(),
        "Upload batch finished"
    );

    Ok(HttpResponse::Ok().json(to_response(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_response_flattens_reason() {
        let response = failure_response(FileFailure {
            file: "a.exe".to_string(),
            reason: FailureReason::Invalid {
                errors: vec!["Unsupported file type".to_string()],
            },
        });

        assert_eq!(response.reason, "invalid");
        assert_eq!(response.errors, vec!["Unsupported file type".to_string()]);
        assert_eq!(response.message, "Unsupported file type");
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let err = decode(UploadFilePayload {
            name: "a.png".to_string(),
            mime_type: "image/png".to_string(),
            data_base64: "not base64!!".to_string(),
        })
        .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("a.png")));
    }
}
