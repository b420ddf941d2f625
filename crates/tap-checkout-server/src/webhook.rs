//! Webhook receiver.
//!
//! Registered on the raw body so a signature can be verified over the exact
//! bytes the gateway sent. Events are logged and acknowledged, never acted
//! upon: there is no local state to update, and an unverified event is
//! never treated as authoritative.

use actix_web::{post, web, HttpRequest, HttpResponse};
use serde_json::Value;
use tap_checkout::signature;

use crate::metrics;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "X-Tap-Signature";

#[post("/api/tap/webhook")]
pub async fn webhook(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> HttpResponse {
    if let Some(secret) = &state.webhook_secret {
        let header = req
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        match header {
            Some(sig) if signature::verify(secret, &body, sig) => {}
            Some(_) => {
                tracing::warn!("webhook signature mismatch");
                metrics::WEBHOOK_EVENTS
                    .with_label_values(&["bad_signature"])
                    .inc();
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "invalid_signature"
                }));
            }
            None => {
                tracing::warn!("webhook signature header missing");
                metrics::WEBHOOK_EVENTS
                    .with_label_values(&["missing_signature"])
                    .inc();
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "signature_required"
                }));
            }
        }
    }

    let Ok(text) = std::str::from_utf8(&body) else {
        metrics::WEBHOOK_EVENTS.with_label_values(&["bad"]).inc();
        return HttpResponse::BadRequest().body("bad");
    };

    match serde_json::from_str::<Value>(text) {
        Ok(event) => {
            tracing::info!(
                id = event.pointer("/object/id").and_then(|v| v.as_str()).unwrap_or("-"),
                status = event
                    .pointer("/object/status")
                    .and_then(|v| v.as_str())
                    .unwrap_or("-"),
                "webhook event received"
            );
            metrics::WEBHOOK_EVENTS.with_label_values(&["ok"]).inc();
        }
        Err(_) => {
            // Not JSON; acknowledged anyway, nothing to act on.
            tracing::debug!(bytes = body.len(), "non-JSON webhook payload");
            metrics::WEBHOOK_EVENTS.with_label_values(&["non_json"]).inc();
        }
    }

    HttpResponse::Ok().body("ok")
}
