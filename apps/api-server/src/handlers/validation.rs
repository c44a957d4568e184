//! Public validation endpoints. They never store anything and are not rate limited.

use actix_web::{HttpResponse, web};
use gateway_core::validation::{sanitize_rich_text, validate_content_safety, validate_password_strength};
use gateway_shared::dto::{
    ContentCheckRequest, ContentCheckResponse, PasswordCheckRequest, ValidationResponse,
};

/// POST /api/validation/password
pub async fn check_password(body: web::Json<PasswordCheckRequest>) -> HttpResponse {
    let result = validate_password_strength(&body.password);
    HttpResponse::Ok().json(ValidationResponse {
        is_valid: result.is_valid,
        errors: result.errors,
    })
}

/// POST /api/validation/content
pub async fn check_content(body: web::Json<ContentCheckRequest>) -> HttpResponse {
    HttpResponse::Ok().json(ContentCheckResponse {
        is_safe: validate_content_safety(&body.content),
        sanitized: sanitize_rich_text(&body.content),
    })
}
