use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    checked_at: String,
    /// `memory` when this process holds its own counters, `redis` when shared.
    rate_limiter: &'static str,
}

/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let rate_limiter = match state.local_limiter {
        Some(_) => "memory",
        None => "redis",
    };

    HttpResponse::Ok().json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        checked_at: chrono::Utc::now().to_rfc3339(),
        rate_limiter,
    })
}
