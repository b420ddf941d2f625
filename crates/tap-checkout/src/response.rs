//! Normalized views of gateway replies.
//!
//! Every reply keeps the raw payload alongside the extracted fields so
//! callers can branch on gateway-specific detail the normalization drops.

use serde::Serialize;
use serde_json::Value;

/// Gateway status meaning the authorization can be captured.
pub const STATUS_AUTHORIZED: &str = "AUTHORIZED";
/// Gateway status meaning funds were captured.
pub const STATUS_CAPTURED: &str = "CAPTURED";

/// Outcome of one gateway call.
///
/// `Accepted` carries the normalized view of a 2xx reply. `Rejected`
/// preserves a non-2xx status code and body verbatim so the caller can pass
/// them through and branch on gateway-specific status codes.
#[derive(Debug, Clone)]
pub enum GatewayReply<T> {
    Accepted(T),
    Rejected { http_status: u16, body: Value },
}

/// One-time tokenized card, safe to pass through non-PCI-scoped systems.
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    pub id: String,
    pub raw: Value,
}

impl Token {
    pub(crate) fn from_raw(raw: Value) -> Self {
        Self {
            id: str_field(&raw, "/id"),
            raw,
        }
    }
}

/// A gateway-side reservation of funds pending capture. Never stored
/// locally; re-fetched from the gateway by id when the flow resumes.
#[derive(Debug, Clone, Serialize)]
pub struct Authorization {
    pub id: String,
    /// Gateway status string, carried verbatim and never mapped.
    pub status: String,
    pub amount: f64,
    pub currency: String,
    /// 3-D-Secure challenge URL the browser must follow, when present.
    pub transaction_url: Option<String>,
    /// Back-reference to the originating order, when the gateway echoes one.
    pub order_ref: Option<String>,
    pub raw: Value,
}

impl Authorization {
    pub(crate) fn from_raw(raw: Value) -> Self {
        Self {
            id: str_field(&raw, "/id"),
            status: str_field(&raw, "/status"),
            amount: raw.pointer("/amount").and_then(Value::as_f64).unwrap_or(0.0),
            currency: str_field(&raw, "/currency"),
            transaction_url: opt_str_field(&raw, "/transaction/url"),
            order_ref: opt_str_field(&raw, "/reference/order"),
            raw,
        }
    }
}

/// The funds-transfer attempt tied to one authorization.
#[derive(Debug, Clone, Serialize)]
pub struct Capture {
    pub id: String,
    pub status: String,
    pub amount: f64,
    pub currency: String,
    pub raw: Value,
}

impl Capture {
    pub(crate) fn from_raw(raw: Value) -> Self {
        Self {
            id: str_field(&raw, "/id"),
            status: str_field(&raw, "/status"),
            amount: raw.pointer("/amount").and_then(Value::as_f64).unwrap_or(0.0),
            currency: str_field(&raw, "/currency"),
            raw,
        }
    }
}

fn str_field(raw: &Value, pointer: &str) -> String {
    raw.pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_str_field(raw: &Value, pointer: &str) -> Option<String> {
    raw.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn authorization_extracts_redirect_url() {
        let auth = Authorization::from_raw(json!({
            "id": "auth_1",
            "status": "INITIATED",
            "amount": 10,
            "currency": "USD",
            "transaction": { "url": "https://gateway.example/3ds/auth_1" },
        }));
        assert_eq!(auth.id, "auth_1");
        assert_eq!(auth.status, "INITIATED");
        assert_eq!(auth.amount, 10.0);
        assert_eq!(
            auth.transaction_url.as_deref(),
            Some("https://gateway.example/3ds/auth_1")
        );
        assert_eq!(auth.order_ref, None);
    }

    #[test]
    fn missing_fields_normalize_to_defaults() {
        let capture = Capture::from_raw(json!({ "status": "CAPTURED" }));
        assert_eq!(capture.id, "");
        assert_eq!(capture.status, STATUS_CAPTURED);
        assert_eq!(capture.amount, 0.0);
    }
}
