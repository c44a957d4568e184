//! HTTP handlers and route configuration.

mod boosts;
mod health;
mod posts;
mod uploads;
mod validation;

use actix_web::web;

/// Configure all application routes. `upload_body_limit` caps the JSON body
/// of the upload route, which carries base64 file contents.
pub fn configure_routes(cfg: &mut web::ServiceConfig, upload_body_limit: usize) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/validation")
                    .route("/password", web::post().to(validation::check_password))
                    .route("/content", web::post().to(validation::check_content)),
            )
            // Guarded actions
            .route("/posts", web::post().to(posts::create_post))
            .service(
                web::resource("/uploads")
                    .app_data(web::JsonConfig::default().limit(upload_body_limit))
                    .route(web::post().to(uploads::upload_files)),
            )
            .route("/boosts/checkout", web::post().to(boosts::create_checkout)),
    );
}
