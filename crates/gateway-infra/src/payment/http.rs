//! Hosted-checkout payment processor client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use gateway_core::ports::{CheckoutSession, PaymentError, PaymentProcessor, SessionRequest};

#[derive(Debug, Clone)]
pub struct HttpPaymentConfig {
    /// Processor API base, e.g. `https://api.payments.example.com`.
    pub api_url: String,
    /// Secret API key. Never logged.
    pub api_key: String,
    pub success_url: String,
    pub cancel_url: String,
    pub request_timeout: Duration,
}

impl HttpPaymentConfig {
    /// `None` when `PAYMENT_API_URL` is unset.
    pub fn from_env() -> Option<Self> {
        let api_url = std::env::var("PAYMENT_API_URL").ok().filter(|u| !u.is_empty())?;
        Some(Self {
            api_url,
            api_key: std::env::var("PAYMENT_API_KEY").unwrap_or_default(),
            success_url: std::env::var("CHECKOUT_SUCCESS_URL")
                .unwrap_or_else(|_| "http://localhost:3000/boosts/success".to_string()),
            cancel_url: std::env::var("CHECKOUT_CANCEL_URL")
                .unwrap_or_else(|_| "http://localhost:3000/boosts/cancel".to_string()),
            request_timeout: Duration::from_secs(30),
        })
    }
}

#[derive(Debug, Serialize)]
struct CreateSessionBody<'a> {
    mode: &'static str,
    amount: i64,
    currency: &'a str,
    description: &'a str,
    success_url: &'a str,
    cancel_url: &'a str,
    metadata: SessionMetadata,
}

#[derive(Debug, Serialize)]
struct SessionMetadata {
    target_post_id: String,
    user_id: String,
    boost_type: &'static str,
    duration_days: u32,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

fn build_body<'a>(request: &'a SessionRequest, config: &'a HttpPaymentConfig) -> CreateSessionBody<'a> {
    CreateSessionBody {
        mode: "payment",
        amount: request.amount,
        currency: request.currency,
        description: &request.description,
        success_url: &config.success_url,
        cancel_url: &config.cancel_url,
        metadata: SessionMetadata {
            target_post_id: request.metadata.target_post_id.to_string(),
            user_id: request.metadata.user_id.to_string(),
            boost_type: request.metadata.boost_type.as_str(),
            duration_days: request.metadata.duration_days,
        },
    }
}

fn parse_session(body: &str) -> Result<CheckoutSession, PaymentError> {
    let session: SessionResponse =
        serde_json::from_str(body).map_err(|e| PaymentError::Protocol(e.to_string()))?;
    let redirect_url = session
        .url
        .ok_or_else(|| PaymentError::Protocol(format!("session {} has no redirect url", session.id)))?;
    Ok(CheckoutSession {
        session_id: session.id,
        redirect_url,
    })
}

fn parse_error(status: reqwest::StatusCode, body: &str) -> PaymentError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| match e.error.code {
            Some(code) => format!("{}: {}", code, e.error.message),
            None => e.error.message,
        })
        .unwrap_or_else(|_| body.to_string());

    if status.is_client_error() {
        PaymentError::Declined(format!("{} {}", status.as_u16(), detail))
    } else {
        PaymentError::Protocol(format!("{} {}", status.as_u16(), detail))
    }
}

pub struct HttpPaymentProcessor {
    client: reqwest::Client,
    config: HttpPaymentConfig,
}

impl HttpPaymentProcessor {
    pub fn new(config: HttpPaymentConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PaymentError::Connection(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl PaymentProcessor for HttpPaymentProcessor {
    async fn create_session(&self, request: &SessionRequest) -> Result<CheckoutSession, PaymentError> {
        let url = format!(
            "{}/v1/checkout/sessions",
            self.config.api_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .header("Idempotency-Key", &request.idempotency_key)
            .json(&build_body(request, &self.config))
            .send()
            .await
            .map_err(|e| PaymentError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Connection(e.to_string()))?;

        if !status.is_success() {
            return Err(parse_error(status, &body));
        }

        let session = parse_session(&body)?;
        tracing::debug!(session_id = %session.session_id, amount = request.amount, "Checkout session created");
        Ok(session)
    }
}
