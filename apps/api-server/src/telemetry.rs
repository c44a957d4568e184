//! Global tracing subscriber: env filter, pretty or JSON output, alert forwarding.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::observability::{AlertConfig, AlertLayer};

const DEFAULT_FILTER: &str = "info,api_server=debug,gateway_infra=debug,gateway_core=debug";

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub json_logs: bool,
    pub alerts_enabled: bool,
    /// Alerts go to stderr when unset.
    pub alert_webhook_url: Option<String>,
}

fn flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => !matches!(v.to_lowercase().as_str(), "false" | "0" | "off"),
        Err(_) => default,
    }
}

impl TelemetryConfig {
    /// `LOG_FORMAT=json`, `ALERTS_ENABLED`, `ALERT_WEBHOOK_URL`.
    pub fn from_env() -> Self {
        Self {
            json_logs: std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
            alerts_enabled: flag("ALERTS_ENABLED", true),
            alert_webhook_url: std::env::var("ALERT_WEBHOOK_URL")
                .ok()
                .filter(|u| !u.is_empty()),
        }
    }

    fn alert_layer(&self) -> Option<AlertLayer> {
        if !self.alerts_enabled {
            return None;
        }
        Some(match &self.alert_webhook_url {
            Some(url) => AlertLayer::webhook(url.clone(), AlertConfig::default()),
            None => AlertLayer::console(AlertConfig::default()),
        })
    }
}

/// Install the global subscriber. Must run inside the Tokio runtime.
pub fn init_telemetry(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(config.alert_layer());

    if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }

    tracing::info!(
        json_logs = config.json_logs,
        alerts_enabled = config.alerts_enabled,
        alert_webhook = config.alert_webhook_url.is_some(),
        "Telemetry initialized"
    );
}
