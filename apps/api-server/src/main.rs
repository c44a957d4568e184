//! # Action Gateway API Server
//!
//! Actix-web front for the guarded actions: posting, file upload and boost
//! checkout, plus the public validation endpoints.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

#[cfg(feature = "scheduler")]
mod background;
mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        host = %config.host,
        port = config.port,
        backend = ?config.rate_limit.backend,
        "Starting action gateway"
    );

    let state = AppState::new(&config).await;

    #[cfg(feature = "scheduler")]
    let mut scheduler = start_scheduler(&state).await;

    let server_state = state.clone();
    let upload_body_limit = config.upload.json_body_limit();
    let result = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(server_state.clone()))
            .configure(|cfg| handlers::configure_routes(cfg, upload_body_limit))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    #[cfg(feature = "scheduler")]
    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler did not stop cleanly");
        }
    }

    result
}

/// Schedule the limiter sweep. Only the process-local limiter needs one;
/// Redis expires keys itself.
#[cfg(feature = "scheduler")]
async fn start_scheduler(state: &AppState) -> Option<background::Scheduler> {
    use background::{Scheduler, SchedulerConfig};

    let limiter = state.local_limiter.clone()?;

    let scheduler = match Scheduler::new(SchedulerConfig::from_env()).await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create scheduler");
            return None;
        }
    };

    if let Err(e) = scheduler.add_rate_limit_sweep(limiter).await {
        tracing::error!(error = %e, "Failed to register rate limit sweep");
        return None;
    }
    if let Err(e) = scheduler.start().await {
        tracing::error!(error = %e, "Failed to start scheduler");
        return None;
    }

    Some(scheduler)
}
