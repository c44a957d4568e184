//! Error handling - RFC 7807 compliant responses.

use std::fmt;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use gateway_core::GatewayError;
use gateway_shared::ErrorResponse;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    Gateway(GatewayError),
    /// Malformed request body the gateway never saw.
    BadRequest(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Gateway(e) => write!(f, "{}", e),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Gateway(err)
    }
}

fn retry_after_secs(err: &GatewayError) -> Option<u64> {
    match err {
        // Round up so clients never retry early.
        GatewayError::RateLimited { retry_after } => {
            Some(retry_after.as_millis().div_ceil(1000).max(1) as u64)
        }
        _ => None,
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Gateway(e) => match e {
                GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
                GatewayError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                GatewayError::InvalidTier(_) | GatewayError::FileLimitExceeded { .. } => {
                    StatusCode::BAD_REQUEST
                }
                GatewayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
                GatewayError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());

        let error = match self {
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Gateway(e) => match e {
                GatewayError::Unauthorized => {
                    ErrorResponse::unauthorized().with_detail(e.public_message())
                }
                GatewayError::Validation(errors) => ErrorResponse::validation_failed(errors.clone()),
                GatewayError::RateLimited { .. } => {
                    let secs = retry_after_secs(e).unwrap_or(1);
                    builder.insert_header(("Retry-After", secs.to_string()));
                    ErrorResponse::too_many_requests(secs)
                }
                GatewayError::InvalidTier(_) | GatewayError::FileLimitExceeded { .. } => {
                    ErrorResponse::bad_request(e.public_message())
                }
                GatewayError::Upstream { step, detail } => {
                    tracing::error!(step = %step, detail = %detail, "Upstream failure");
                    ErrorResponse::bad_gateway(e.public_message())
                }
                GatewayError::Persistence { step, detail } => {
                    tracing::error!(step = %step, detail = %detail, "Persistence failure");
                    ErrorResponse::internal_error().with_detail(e.public_message())
                }
            },
        };

        let mut error = error;
        if let AppError::Gateway(e) = self {
            error.error_type = format!("urn:gateway:error:{}", e.kind());
        }

        builder.json(error)
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
