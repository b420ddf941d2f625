//! Wire-shaped request types for the checkout flow.
//!
//! Field names follow the gateway's snake_case card/customer schema so the
//! structs serialize directly into outbound request bodies.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Raw card details collected by the checkout frontend. Forwarded to the
/// gateway's tokens endpoint unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub number: String,
    pub exp_month: u8,
    pub exp_year: u16,
    pub cvc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Customer identity forwarded with an authorization. All fields optional;
/// placeholders are substituted at request-build time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// National phone number; the country code is fixed at request build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Customer {
    /// Gateway-facing body. The gateway rejects requests with empty required
    /// fields, and missing customer data is not treated as fatal here, so
    /// absent fields become placeholders.
    pub(crate) fn to_body(&self) -> Value {
        let mut body = json!({
            "first_name": self.first_name.as_deref().unwrap_or("NA"),
            "last_name": self.last_name.as_deref().unwrap_or("NA"),
            "email": self.email.as_deref().unwrap_or("na@example.com"),
        });
        if let Some(phone) = &self.phone {
            body["phone"] = json!({ "country_code": "1", "number": phone });
        }
        body
    }
}

/// Funding source for an authorization: a pre-made token from the card SDK,
/// or raw card details that will be tokenized first.
#[derive(Debug, Clone)]
pub enum PaymentSource {
    Token(String),
    Card(Card),
}

/// One authorization attempt against the gateway.
#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    pub amount: f64,
    pub currency: String,
    pub source: PaymentSource,
    pub customer: Customer,
    /// Opaque order identifier threaded through the flow for correlation.
    pub order_ref: Option<String>,
    /// Where the gateway sends the browser back after the 3-D-Secure
    /// challenge completes (or is skipped).
    pub redirect_url: String,
    pub client_ip: Option<String>,
}

/// One capture attempt tied to an existing authorization.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub authorize_id: String,
    pub amount: f64,
    pub currency: String,
    pub order_ref: Option<String>,
    /// Caller-supplied idempotency key; a stable one is derived from the
    /// authorization id when absent.
    pub idempotency_key: Option<String>,
}
