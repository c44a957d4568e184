//! Alerting layer for tracing.
//!
//! Forwards events at or above a configured level (ERROR by default) to an
//! alert channel. Orphaned blobs, unrecorded checkout sessions and database
//! failures are all logged at ERROR and end up here.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{Layer, layer::Context};

#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub level: String,
    pub message: String,
    pub target: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub fields: Vec<(String, String)>,
}

impl AlertMessage {
    fn summary(&self) -> String {
        let fields = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        format!("[{}] {}: {} {}", self.level, self.target, self.message, fields)
    }
}

#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Least severe level that triggers an alert.
    pub min_level: Level,
    pub buffer_size: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            min_level: Level::ERROR,
            buffer_size: 100,
        }
    }
}

#[async_trait::async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Failed to send alert: {0}")]
    SendError(String),
}

/// Writes alerts to stderr. Used in development.
pub struct ConsoleAlertSender;

#[async_trait::async_trait]
impl AlertSender for ConsoleAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        eprintln!("ALERT {} at {}", alert.summary(), alert.timestamp);
        Ok(())
    }
}

/// Posts alerts to a chat webhook (Slack, Discord, etc.).
pub struct WebhookAlertSender {
    url: String,
    client: reqwest::Client,
}

impl WebhookAlertSender {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl AlertSender for WebhookAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        let payload = serde_json::json!({
            "text": format!("*Action gateway alert*\n{}\n*Time:* {}", alert.summary(), alert.timestamp)
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AlertError::SendError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AlertError::SendError(format!(
                "webhook answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}

pub struct AlertLayer {
    sender: mpsc::Sender<AlertMessage>,
    min_level: Level,
}

impl AlertLayer {
    /// Must be called inside a Tokio runtime; spawns the delivery task.
    pub fn new(alert_sender: Arc<dyn AlertSender>, config: AlertConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertMessage>(config.buffer_size.max(1));

        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                if let Err(e) = alert_sender.send(alert).await {
                    // Not through tracing: that would feed back into this layer.
                    eprintln!("{}", e);
                }
            }
        });

        Self {
            sender: tx,
            min_level: config.min_level,
        }
    }

    pub fn console(config: AlertConfig) -> Self {
        Self::new(Arc::new(ConsoleAlertSender), config)
    }

    pub fn webhook(url: String, config: AlertConfig) -> Self {
        Self::new(Arc::new(WebhookAlertSender::new(url)), config)
    }

    fn should_alert(&self, level: &Level) -> bool {
        // More severe levels compare as smaller.
        *level <= self.min_level
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl FieldVisitor {
    fn record(&mut self, field: &tracing::field::Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.record(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.record(field, value.to_string());
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !self.should_alert(event.metadata().level()) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let alert = AlertMessage {
            level: event.metadata().level().to_string(),
            message: visitor.message,
            target: event.metadata().target().to_string(),
            timestamp: chrono::Utc::now(),
            fields: visitor.fields,
        };

        // Drop on a full buffer rather than block the logging thread.
        let _ = self.sender.try_send(alert);
    }
}
