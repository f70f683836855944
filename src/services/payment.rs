//! Payment provider integration
//!
//! Talks to a Stripe-style hosted checkout API: the backend creates a
//! checkout session, redirects the buyer to the provider's page, and learns
//! about the outcome through signed webhook events. The provider sits behind
//! a trait so the checkout service can be tested against a mock.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Allowed clock skew between the webhook timestamp and our clock, seconds.
/// Events outside this window are treated as replays.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// A checkout session created at the provider
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Provider-side session id (`cs_...`)
    pub id: String,
    /// Hosted payment page to redirect the buyer to
    pub url: String,
}

/// Outbound payment operations
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted checkout session for an order
    async fn create_checkout_session(
        &self,
        order_id: i64,
        amount_minor: i64,
        currency: &str,
        description: &str,
    ) -> Result<CheckoutSession>;

    /// Expire a checkout session after the buyer cancels the order
    async fn expire_checkout_session(&self, session_id: &str) -> Result<()>;
}

/// HTTP client for the payment provider's REST API
pub struct HttpPaymentProvider {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
    success_url: String,
    cancel_url: String,
}

impl HttpPaymentProvider {
    pub fn new(
        base_url: String,
        secret_key: String,
        success_url: String,
        cancel_url: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            secret_key,
            success_url,
            cancel_url,
        }
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn create_checkout_session(
        &self,
        order_id: i64,
        amount_minor: i64,
        currency: &str,
        description: &str,
    ) -> Result<CheckoutSession> {
        #[derive(Deserialize)]
        struct SessionResponse {
            id: String,
            url: String,
        }

        let params = [
            ("mode", "payment".to_string()),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
            ("metadata[order_id]", order_id.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", currency.to_lowercase()),
            (
                "line_items[0][price_data][unit_amount]",
                amount_minor.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                description.to_string(),
            ),
        ];

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .context("Failed to reach payment provider")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Payment provider rejected session creation: {} {}", status, body);
        }

        let session: SessionResponse = response
            .json()
            .await
            .context("Failed to parse checkout session response")?;

        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }

    async fn expire_checkout_session(&self, session_id: &str) -> Result<()> {
        let response = self
            .client
            .post(format!(
                "{}/v1/checkout/sessions/{}/expire",
                self.base_url, session_id
            ))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .context("Failed to reach payment provider")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Payment provider refused to expire session: {}", status);
        }
        Ok(())
    }
}

/// Verify a webhook signature header of the form `t=<unix>,v1=<hex hmac>`.
///
/// The signed payload is `"{t}.{body}"` keyed with the webhook secret. The
/// timestamp must be within [`SIGNATURE_TOLERANCE_SECS`] of now.
pub fn verify_webhook_signature(secret: &str, header: &str, payload: &str) -> bool {
    verify_webhook_signature_at(secret, header, payload, Utc::now().timestamp())
}

fn verify_webhook_signature_at(secret: &str, header: &str, payload: &str, now: i64) -> bool {
    let mut timestamp: Option<i64> = None;
    let mut signature: Option<String> = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signature = Some(value.to_string()),
            _ => {}
        }
    }
    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return false;
    };

    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return false;
    }

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    let expected = hex_encode(&mac.finalize().into_bytes());

    // Constant-time comparison
    expected.len() == signature.len()
        && expected
            .bytes()
            .zip(signature.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parsed webhook event.
///
/// Only the fields the checkout service acts on are modeled; unknown event
/// types are acknowledged and ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: WebhookObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookObject {
    /// Session or charge id at the provider
    pub id: String,
    /// Payment id, present on completed checkout sessions
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub metadata: WebhookMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookMetadata {
    #[serde(default)]
    pub order_id: Option<String>,
}

impl WebhookEvent {
    /// Parse the raw webhook body
    pub fn parse(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).context("Failed to parse webhook payload")
    }

    /// The order id from event metadata, if the provider echoed it back
    pub fn order_id(&self) -> Option<i64> {
        self.data
            .object
            .metadata
            .order_id
            .as_deref()
            .and_then(|id| id.parse().ok())
    }
}
