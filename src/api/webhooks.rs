//! Payment webhook endpoint
//!
//! The payment provider posts signed events here. The signature covers the
//! raw body, so this handler takes the payload as a string and only parses
//! it after the signature checks out. Handlers are idempotent; replays and
//! out-of-order deliveries are acknowledged without side effects.

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};

use crate::api::middleware::{ApiError, AppState};
use crate::services::payment::{verify_webhook_signature, WebhookEvent};

const SIGNATURE_HEADER: &str = "webhook-signature";

/// Build the webhook router (public; authenticated by signature)
pub fn router() -> Router<AppState> {
    Router::new().route("/payment", post(handle_payment_webhook))
}

/// POST /api/v1/webhooks/payment
async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing webhook signature"))?;

    if !verify_webhook_signature(&state.webhook_secret, signature, &body) {
        tracing::warn!("Rejected webhook with invalid signature");
        return Err(ApiError::unauthorized("Invalid webhook signature"));
    }

    let event = WebhookEvent::parse(&body)
        .map_err(|e| ApiError::validation_error(format!("Malformed webhook payload: {}", e)))?;

    tracing::info!(event_type = %event.event_type, "Processing payment webhook");
    state.checkout_service.handle_webhook_event(&event).await?;

    Ok(Json(serde_json::json!({ "received": true })))
}
