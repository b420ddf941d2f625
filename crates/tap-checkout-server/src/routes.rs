use std::time::Instant;

use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpRequest, HttpResponse, ResponseError};
use serde::Deserialize;
use serde_json::{json, Value};
use tap_checkout::{
    signature, AuthorizeRequest, Card, CaptureRequest, Customer, GatewayReply, PaymentSource,
};
use url::Url;

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

/// Return path the browser lands on after the 3-D-Secure challenge when the
/// caller does not supply one.
const DEFAULT_RETURN_PATH: &str = "/pay/return";

#[derive(Debug, Deserialize)]
pub struct TokenBody {
    pub card: Card,
    #[serde(default)]
    pub client_ip: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeBody {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub token_id: Option<String>,
    #[serde(default)]
    pub card: Option<Card>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub return_path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureBody {
    #[serde(default)]
    pub authorize_id: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeBody {
    #[serde(default)]
    pub authorize_id: Option<String>,
}

/// Build the 3-D-Secure return link: return path joined onto the public web
/// base, with the order id attached for correlation.
fn return_url(
    web_base_url: &str,
    return_path: Option<&str>,
    order_id: Option<&str>,
) -> Result<String, ApiError> {
    let base = Url::parse(web_base_url).map_err(|_| ApiError::Validation("invalid_return_url"))?;
    let mut url = base
        .join(return_path.unwrap_or(DEFAULT_RETURN_PATH))
        .map_err(|_| ApiError::Validation("invalid_return_path"))?;
    if let Some(order) = order_id {
        url.query_pairs_mut().append_pair("order", order);
    }
    Ok(url.into())
}

/// Translate an inbound authorize body into the core request. Only source
/// presence is checked here; amount validation happens in the client, before
/// any network call.
fn build_authorize_request(
    web_base_url: &str,
    body: AuthorizeBody,
) -> Result<AuthorizeRequest, ApiError> {
    let source = match (body.token_id, body.card) {
        (Some(token_id), _) if !token_id.trim().is_empty() => PaymentSource::Token(token_id),
        (_, Some(card)) => PaymentSource::Card(card),
        _ => return Err(ApiError::Validation("token_or_card_required")),
    };

    let redirect_url = return_url(
        web_base_url,
        body.return_path.as_deref(),
        body.order_id.as_deref(),
    )?;

    Ok(AuthorizeRequest {
        amount: body.amount.unwrap_or(1.0),
        currency: body.currency.unwrap_or_else(|| "USD".to_string()),
        source,
        customer: body.customer.unwrap_or_default(),
        order_ref: body.order_id,
        redirect_url,
        client_ip: None,
    })
}

/// Re-emit a gateway rejection with its original status code.
fn passthrough(http_status: u16, body: Value) -> HttpResponse {
    HttpResponse::build(StatusCode::from_u16(http_status).unwrap_or(StatusCode::OK)).json(body)
}

#[post("/api/tap/token")]
pub async fn token(state: web::Data<AppState>, body: web::Json<TokenBody>) -> HttpResponse {
    let TokenBody { card, client_ip } = body.into_inner();

    match state.tap.tokenize(&card, client_ip.as_deref()).await {
        Ok(GatewayReply::Accepted(token)) => {
            metrics::TOKENIZE_REQUESTS.with_label_values(&["ok"]).inc();
            HttpResponse::Ok().json(token.raw)
        }
        Ok(GatewayReply::Rejected { http_status, body }) => {
            metrics::TOKENIZE_REQUESTS
                .with_label_values(&["rejected"])
                .inc();
            passthrough(http_status, body)
        }
        Err(err) => {
            metrics::TOKENIZE_REQUESTS
                .with_label_values(&["error"])
                .inc();
            ApiError::from_tap("tokenize", err).error_response()
        }
    }
}

#[post("/api/tap/authorize")]
pub async fn authorize(state: web::Data<AppState>, body: web::Json<AuthorizeBody>) -> HttpResponse {
    let request = match build_authorize_request(&state.web_base_url, body.into_inner()) {
        Ok(request) => request,
        Err(err) => return err.error_response(),
    };

    let started = Instant::now();
    match state.tap.authorize(&request).await {
        Ok(GatewayReply::Accepted(auth)) => {
            metrics::AUTHORIZE_REQUESTS.with_label_values(&["ok"]).inc();
            metrics::GATEWAY_LATENCY
                .with_label_values(&["authorize", "ok"])
                .observe(started.elapsed().as_secs_f64());
            HttpResponse::Ok().json(json!({
                "ok": true,
                "status": auth.status,
                "id": auth.id,
                "amount": auth.amount,
                "transaction_url": auth.transaction_url,
                "raw": auth.raw,
            }))
        }
        Ok(GatewayReply::Rejected { http_status, body }) => {
            metrics::AUTHORIZE_REQUESTS
                .with_label_values(&["rejected"])
                .inc();
            metrics::GATEWAY_LATENCY
                .with_label_values(&["authorize", "rejected"])
                .observe(started.elapsed().as_secs_f64());
            let status = body.get("status").cloned().unwrap_or(Value::Null);
            let id = body.get("id").cloned().unwrap_or(Value::Null);
            let amount = body.get("amount").cloned().unwrap_or(Value::Null);
            let transaction_url = body.pointer("/transaction/url").cloned().unwrap_or(Value::Null);
            passthrough(
                http_status,
                json!({
                    "ok": false,
                    "status": status,
                    "id": id,
                    "amount": amount,
                    "transaction_url": transaction_url,
                    "raw": body,
                }),
            )
        }
        Err(err) => {
            metrics::AUTHORIZE_REQUESTS
                .with_label_values(&["error"])
                .inc();
            ApiError::from_tap("authorize", err).error_response()
        }
    }
}

#[post("/api/tap/capture")]
pub async fn capture(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CaptureBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let Some(authorize_id) = body.authorize_id.filter(|s| !s.trim().is_empty()) else {
        return ApiError::Validation("authorize_id_required").error_response();
    };

    let idempotency_key = req
        .headers()
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let request = CaptureRequest {
        authorize_id,
        amount: body.amount.unwrap_or(1.0),
        currency: "USD".to_string(),
        order_ref: body.order_id,
        idempotency_key,
    };

    let started = Instant::now();
    match state.tap.capture(&request).await {
        Ok(GatewayReply::Accepted(capture)) => {
            metrics::CAPTURE_REQUESTS.with_label_values(&["ok"]).inc();
            metrics::GATEWAY_LATENCY
                .with_label_values(&["capture", "ok"])
                .observe(started.elapsed().as_secs_f64());
            HttpResponse::Ok().json(json!({
                "ok": true,
                "status": capture.status,
                "id": capture.id,
                "raw": capture.raw,
            }))
        }
        Ok(GatewayReply::Rejected { http_status, body }) => {
            metrics::CAPTURE_REQUESTS
                .with_label_values(&["rejected"])
                .inc();
            metrics::GATEWAY_LATENCY
                .with_label_values(&["capture", "rejected"])
                .observe(started.elapsed().as_secs_f64());
            let status = body.get("status").cloned().unwrap_or(Value::Null);
            let id = body.get("id").cloned().unwrap_or(Value::Null);
            passthrough(
                http_status,
                json!({
                    "ok": false,
                    "status": status,
                    "id": id,
                    "raw": body,
                }),
            )
        }
        Err(err) => {
            metrics::CAPTURE_REQUESTS.with_label_values(&["error"]).inc();
            ApiError::from_tap("capture", err).error_response()
        }
    }
}

/// Passthrough lookup used by the return page to confirm 3-D-Secure
/// completion.
#[get("/api/tap/authorize/{id}")]
pub async fn fetch_authorize(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match state.tap.fetch_authorization(&id).await {
        Ok(GatewayReply::Accepted(auth)) => HttpResponse::Ok().json(auth.raw),
        Ok(GatewayReply::Rejected { http_status, body }) => passthrough(http_status, body),
        Err(err) => ApiError::from_tap("fetch_authorize", err).error_response(),
    }
}

fn finalize_outcome_label(outcome: &tap_checkout::Finalization) -> &'static str {
    match outcome {
        tap_checkout::Finalization::PendingRedirect { .. } => "pending_redirect",
        tap_checkout::Finalization::Captured { .. } => "captured",
        tap_checkout::Finalization::Failed { .. } => "failed",
    }
}

/// Server-driven finalization: authorize, then either hand back the 3-D-Secure
/// redirect or capture immediately.
#[post("/api/tap/finalize")]
pub async fn finalize(state: web::Data<AppState>, body: web::Json<AuthorizeBody>) -> HttpResponse {
    let request = match build_authorize_request(&state.web_base_url, body.into_inner()) {
        Ok(request) => request,
        Err(err) => return err.error_response(),
    };

    match state.sequencer.begin(&request).await {
        Ok(outcome) => {
            metrics::FINALIZE_REQUESTS
                .with_label_values(&[finalize_outcome_label(&outcome)])
                .inc();
            HttpResponse::Ok().json(outcome)
        }
        Err(err) => {
            metrics::FINALIZE_REQUESTS.with_label_values(&["error"]).inc();
            ApiError::from_tap("finalize", err).error_response()
        }
    }
}

/// Second finalization leg, called by the return page once the browser is
/// back from the challenge.
#[post("/api/tap/finalize/resume")]
pub async fn finalize_resume(
    state: web::Data<AppState>,
    body: web::Json<ResumeBody>,
) -> HttpResponse {
    let Some(authorize_id) = body.into_inner().authorize_id.filter(|s| !s.trim().is_empty())
    else {
        return ApiError::Validation("authorize_id_required").error_response();
    };

    match state.sequencer.resume(&authorize_id).await {
        Ok(outcome) => {
            metrics::FINALIZE_REQUESTS
                .with_label_values(&[finalize_outcome_label(&outcome)])
                .inc();
            HttpResponse::Ok().json(outcome)
        }
        Err(err) => {
            metrics::FINALIZE_REQUESTS.with_label_values(&["error"]).inc();
            ApiError::from_tap("finalize", err).error_response()
        }
    }
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "tap-checkout",
    }))
}

#[get("/metrics")]
pub async fn metrics_endpoint(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    if let Some(expected) = &state.metrics_token {
        let authorized = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|bearer_token| signature::constant_time_eq(bearer_token.as_bytes(), expected.as_bytes()))
            .unwrap_or(false);

        if !authorized {
            return HttpResponse::Unauthorized().json(json!({
                "error": "unauthorized",
                "message": "Valid Bearer token required for /metrics"
            }));
        }
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::metrics_output())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_url_appends_order() {
        let url = return_url("https://shop.example.com", None, Some("ORD-9")).unwrap();
        assert_eq!(url, "https://shop.example.com/pay/return?order=ORD-9");
    }

    #[test]
    fn return_url_honors_custom_path() {
        let url = return_url("https://shop.example.com", Some("/checkout/done"), None).unwrap();
        assert_eq!(url, "https://shop.example.com/checkout/done");
    }

    #[test]
    fn authorize_body_requires_token_or_card() {
        let body = AuthorizeBody {
            amount: Some(10.0),
            currency: None,
            order_id: None,
            token_id: None,
            card: None,
            customer: None,
            return_path: None,
        };
        let err = build_authorize_request("https://shop.example.com", body).unwrap_err();
        assert!(matches!(err, ApiError::Validation("token_or_card_required")));
    }

    #[test]
    fn blank_token_falls_back_to_card() {
        let body = AuthorizeBody {
            amount: Some(10.0),
            currency: None,
            order_id: Some("ORD-1".into()),
            token_id: Some("   ".into()),
            card: Some(Card {
                number: "4000000000000002".into(),
                exp_month: 11,
                exp_year: 25,
                cvc: "100".into(),
                name: None,
            }),
            customer: None,
            return_path: None,
        };
        let request = build_authorize_request("https://shop.example.com", body).unwrap();
        assert!(matches!(request.source, PaymentSource::Card(_)));
        assert_eq!(request.order_ref.as_deref(), Some("ORD-1"));
        assert!(request.redirect_url.contains("order=ORD-1"));
    }

    #[test]
    fn missing_amount_defaults_to_one() {
        let body = AuthorizeBody {
            amount: None,
            currency: None,
            order_id: None,
            token_id: Some("tok_test".into()),
            card: None,
            customer: None,
            return_path: None,
        };
        let request = build_authorize_request("https://shop.example.com", body).unwrap();
        assert_eq!(request.amount, 1.0);
        assert_eq!(request.currency, "USD");
    }
}
