//! HTTP client for the Tap REST gateway.
//!
//! Translates the four logical operations into outbound calls and normalizes
//! replies. Validation failures return before any network call; non-2xx
//! replies keep the remote status code and body verbatim.

use std::time::Duration;

use serde_json::{json, Value};

use crate::config::TapConfig;
use crate::error::TapError;
use crate::gateway::PaymentGateway;
use crate::payment::{AuthorizeRequest, Card, CaptureRequest, PaymentSource};
use crate::response::{Authorization, Capture, GatewayReply, Token};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Stable idempotency key for capturing one authorization. Repeated capture
/// calls for the same authorization (a user refreshing the return page, for
/// example) send the same key, and the gateway deduplicates on it.
pub fn capture_idempotency_key(authorize_id: &str) -> String {
    format!("cap-{authorize_id}")
}

/// Client for the remote Tap gateway. Cheap to clone: holds a shared
/// `reqwest::Client` and the immutable [`TapConfig`].
#[derive(Clone)]
pub struct TapClient {
    http: reqwest::Client,
    config: TapConfig,
}

impl TapClient {
    pub fn new(config: TapConfig) -> Self {
        Self::with_http(reqwest::Client::new(), config)
    }

    /// Build with an externally-owned `reqwest::Client`.
    pub fn with_http(http: reqwest::Client, config: TapConfig) -> Self {
        Self { http, config }
    }

    /// Convert raw card details into a one-time token via `POST /tokens`.
    /// Card fields and the optional client IP are forwarded unmodified.
    pub async fn tokenize(
        &self,
        card: &Card,
        client_ip: Option<&str>,
    ) -> Result<GatewayReply<Token>, TapError> {
        if card.number.trim().is_empty() {
            return Err(TapError::Validation("card_number_required"));
        }

        let mut body = json!({ "card": card });
        if let Some(ip) = client_ip {
            body["client_ip"] = Value::String(ip.to_string());
        }

        let request = self.http.post(self.endpoint("tokens")).json(&body);
        let (http_status, raw) = self.dispatch(request).await?;
        if !is_success(http_status) {
            tracing::warn!(http_status, "tokenize rejected by gateway");
            return Ok(GatewayReply::Rejected {
                http_status,
                body: raw,
            });
        }
        Ok(GatewayReply::Accepted(Token::from_raw(raw)))
    }

    /// Reserve funds via `POST /authorize`, with 3-D-Secure enabled
    /// unconditionally. A raw card source is tokenized first (two outbound
    /// calls); a tokenize rejection is passed through as the reply.
    pub async fn authorize(
        &self,
        request: &AuthorizeRequest,
    ) -> Result<GatewayReply<Authorization>, TapError> {
        if !(request.amount.is_finite() && request.amount > 0.0) {
            return Err(TapError::Validation("invalid_amount"));
        }

        let token = match &request.source {
            PaymentSource::Token(id) => {
                if id.trim().is_empty() {
                    return Err(TapError::Validation("token_or_card_required"));
                }
                id.clone()
            }
            PaymentSource::Card(card) => {
                match self.tokenize(card, request.client_ip.as_deref()).await? {
                    GatewayReply::Accepted(token) => token.id,
                    GatewayReply::Rejected { http_status, body } => {
                        return Ok(GatewayReply::Rejected { http_status, body });
                    }
                }
            }
        };

        let body = self.authorize_body(request, &token);
        let outbound = self.http.post(self.endpoint("authorize")).json(&body);
        let (http_status, raw) = self.dispatch(outbound).await?;
        if !is_success(http_status) {
            tracing::warn!(http_status, "authorize rejected by gateway");
            return Ok(GatewayReply::Rejected {
                http_status,
                body: raw,
            });
        }

        let auth = Authorization::from_raw(raw);
        tracing::info!(
            id = %auth.id,
            status = %auth.status,
            redirect = auth.transaction_url.is_some(),
            "authorization created"
        );
        Ok(GatewayReply::Accepted(auth))
    }

    /// Capture an authorization via `POST /charges` with
    /// `source.id = authorize_id`. Sends a stable `Idempotency-Key` so the
    /// gateway can deduplicate repeated captures of the same authorization.
    pub async fn capture(
        &self,
        request: &CaptureRequest,
    ) -> Result<GatewayReply<Capture>, TapError> {
        if request.authorize_id.trim().is_empty() {
            return Err(TapError::Validation("authorize_id_required"));
        }

        let key = request
            .idempotency_key
            .clone()
            .unwrap_or_else(|| capture_idempotency_key(&request.authorize_id));
        let order = request
            .order_ref
            .as_deref()
            .unwrap_or(&request.authorize_id);
        let body = json!({
            "amount": request.amount,
            "currency": request.currency,
            "merchant": { "id": self.config.merchant_id },
            "source": { "id": request.authorize_id },
            "description": format!("Capture for {order}"),
        });

        let outbound = self
            .http
            .post(self.endpoint("charges"))
            .header("Idempotency-Key", &key)
            .json(&body);
        let (http_status, raw) = self.dispatch(outbound).await?;

        let status = raw.pointer("/status").and_then(Value::as_str).unwrap_or("");
        tracing::info!(
            http_status,
            status,
            id = raw.pointer("/id").and_then(|v| v.as_str()).unwrap_or(""),
            authorize_id = %request.authorize_id,
            "capture result"
        );

        if !is_success(http_status) {
            return Ok(GatewayReply::Rejected {
                http_status,
                body: raw,
            });
        }
        Ok(GatewayReply::Accepted(Capture::from_raw(raw)))
    }

    /// Read-only lookup via `GET /authorize/{id}`. Used to confirm
    /// 3-D-Secure completion after the browser returns.
    pub async fn fetch_authorization(
        &self,
        id: &str,
    ) -> Result<GatewayReply<Authorization>, TapError> {
        if id.trim().is_empty() {
            return Err(TapError::Validation("authorize_id_required"));
        }

        let path = format!("authorize/{}", urlencoding::encode(id));
        let request = self.http.get(self.endpoint(&path));
        let (http_status, raw) = self.dispatch(request).await?;
        if !is_success(http_status) {
            return Ok(GatewayReply::Rejected {
                http_status,
                body: raw,
            });
        }
        Ok(GatewayReply::Accepted(Authorization::from_raw(raw)))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.api_base)
    }

    fn authorize_body(&self, request: &AuthorizeRequest, token: &str) -> Value {
        let description = format!("Order {}", request.order_ref.as_deref().unwrap_or(""));
        json!({
            "amount": request.amount,
            "currency": request.currency,
            "threeDSecure": true,
            "description": description.trim(),
            "statement_descriptor": "Sample Auth",
            "merchant": { "id": self.config.merchant_id },
            "customer": request.customer.to_body(),
            "source": { "id": token },
            "redirect": { "url": request.redirect_url },
        })
    }

    /// Send one outbound call and decode the reply. Transport failures carry
    /// no reachable response and surface as [`TapError::Transport`].
    async fn dispatch(&self, request: reqwest::RequestBuilder) -> Result<(u16, Value), TapError> {
        let response = request
            .bearer_auth(&self.config.secret_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| TapError::Transport(format!("gateway unreachable: {e}")))?;

        let http_status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TapError::Transport(format!("failed reading gateway response: {e}")))?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((http_status, body))
    }
}

impl PaymentGateway for TapClient {
    async fn tokenize(
        &self,
        card: &Card,
        client_ip: Option<&str>,
    ) -> Result<GatewayReply<Token>, TapError> {
        TapClient::tokenize(self, card, client_ip).await
    }

    async fn authorize(
        &self,
        request: &AuthorizeRequest,
    ) -> Result<GatewayReply<Authorization>, TapError> {
        TapClient::authorize(self, request).await
    }

    async fn capture(&self, request: &CaptureRequest) -> Result<GatewayReply<Capture>, TapError> {
        TapClient::capture(self, request).await
    }

    async fn fetch_authorization(&self, id: &str) -> Result<GatewayReply<Authorization>, TapError> {
        TapClient::fetch_authorization(self, id).await
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::Customer;

    fn test_card() -> Card {
        Card {
            number: "4000000000000002".into(),
            exp_month: 11,
            exp_year: 25,
            cvc: "100".into(),
            name: None,
        }
    }

    fn authorize_request(source: PaymentSource, amount: f64) -> AuthorizeRequest {
        AuthorizeRequest {
            amount,
            currency: "USD".into(),
            source,
            customer: Customer::default(),
            order_ref: Some("ORD-1".into()),
            redirect_url: "https://shop.example.com/pay/return?order=ORD-1".into(),
            client_ip: None,
        }
    }

    // Validation failures must return before any network call; pointing the
    // client at a closed port makes an accidental call fail loudly.
    fn unreachable_client() -> TapClient {
        TapClient::new(TapConfig::new("http://127.0.0.1:1", "sk_test", "m1"))
    }

    #[test]
    fn idempotency_key_is_deterministic() {
        assert_eq!(capture_idempotency_key("auth_1"), "cap-auth_1");
        assert_eq!(
            capture_idempotency_key("auth_1"),
            capture_idempotency_key("auth_1")
        );
    }

    #[tokio::test]
    async fn authorize_rejects_non_positive_amount_without_network() {
        let client = unreachable_client();
        for amount in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let result = client
                .authorize(&authorize_request(PaymentSource::Token("tok_test".into()), amount))
                .await;
            assert!(matches!(result, Err(TapError::Validation("invalid_amount"))));
        }
    }

    #[tokio::test]
    async fn authorize_rejects_non_positive_amount_on_card_path() {
        let client = unreachable_client();
        let result = client
            .authorize(&authorize_request(PaymentSource::Card(test_card()), 0.0))
            .await;
        assert!(matches!(result, Err(TapError::Validation("invalid_amount"))));
    }

    #[tokio::test]
    async fn authorize_rejects_empty_token() {
        let client = unreachable_client();
        let result = client
            .authorize(&authorize_request(PaymentSource::Token("  ".into()), 10.0))
            .await;
        assert!(matches!(
            result,
            Err(TapError::Validation("token_or_card_required"))
        ));
    }

    #[tokio::test]
    async fn tokenize_rejects_empty_card_number() {
        let client = unreachable_client();
        let mut card = test_card();
        card.number = "".into();
        let result = client.tokenize(&card, None).await;
        assert!(matches!(
            result,
            Err(TapError::Validation("card_number_required"))
        ));
    }

    #[tokio::test]
    async fn capture_rejects_empty_authorize_id() {
        let client = unreachable_client();
        let request = CaptureRequest {
            authorize_id: "".into(),
            amount: 10.0,
            currency: "USD".into(),
            order_ref: None,
            idempotency_key: None,
        };
        assert!(matches!(
            client.capture(&request).await,
            Err(TapError::Validation("authorize_id_required"))
        ));
    }

    #[tokio::test]
    async fn authorize_normalizes_accepted_reply() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/authorize")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "amount": 10.0,
                "currency": "USD",
                "threeDSecure": true,
                "source": { "id": "tok_test" },
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":"auth_1","status":"INITIATED","amount":10,"currency":"USD",
                   "transaction":{"url":"https://gateway.example/3ds/auth_1"}}"#,
            )
            .create_async()
            .await;

        let client = TapClient::new(TapConfig::new(server.url(), "sk_test", "m1"));
        let reply = client
            .authorize(&authorize_request(PaymentSource::Token("tok_test".into()), 10.0))
            .await
            .unwrap();

        match reply {
            GatewayReply::Accepted(auth) => {
                assert_eq!(auth.id, "auth_1");
                assert_eq!(auth.status, "INITIATED");
                assert_eq!(auth.amount, 10.0);
                assert!(auth.transaction_url.is_some());
            }
            other => panic!("expected Accepted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn card_source_tokenizes_first() {
        let mut server = mockito::Server::new_async().await;
        let tokens = server
            .mock("POST", "/tokens")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"tok_from_card"}"#)
            .create_async()
            .await;
        let authorize = server
            .mock("POST", "/authorize")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "source": { "id": "tok_from_card" },
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"auth_2","status":"AUTHORIZED","amount":10,"currency":"USD"}"#)
            .create_async()
            .await;

        let client = TapClient::new(TapConfig::new(server.url(), "sk_test", "m1"));
        let reply = client
            .authorize(&authorize_request(PaymentSource::Card(test_card()), 10.0))
            .await
            .unwrap();

        tokens.assert_async().await;
        authorize.assert_async().await;
        assert!(matches!(reply, GatewayReply::Accepted(auth) if auth.id == "auth_2"));
    }

    #[tokio::test]
    async fn rejected_reply_preserves_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/charges")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"errors":[{"code":"1108","description":"Invalid source id"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = TapClient::new(TapConfig::new(server.url(), "sk_test", "m1"));
        let request = CaptureRequest {
            authorize_id: "auth_bad".into(),
            amount: 10.0,
            currency: "USD".into(),
            order_ref: None,
            idempotency_key: None,
        };
        let reply = client.capture(&request).await.unwrap();

        match reply {
            GatewayReply::Rejected { http_status, body } => {
                assert_eq!(http_status, 400);
                assert_eq!(body["errors"][0]["code"], "1108");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn capture_sends_derived_idempotency_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/charges")
            .match_header("Idempotency-Key", "cap-auth_1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"chg_1","status":"CAPTURED","amount":10,"currency":"USD"}"#)
            .create_async()
            .await;

        let client = TapClient::new(TapConfig::new(server.url(), "sk_test", "m1"));
        let request = CaptureRequest {
            authorize_id: "auth_1".into(),
            amount: 10.0,
            currency: "USD".into(),
            order_ref: None,
            idempotency_key: None,
        };
        let reply = client.capture(&request).await.unwrap();

        mock.assert_async().await;
        assert!(matches!(reply, GatewayReply::Accepted(c) if c.status == "CAPTURED"));
    }

    #[tokio::test]
    async fn capture_prefers_caller_supplied_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/charges")
            .match_header("Idempotency-Key", "client-key-9")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"chg_2","status":"CAPTURED"}"#)
            .create_async()
            .await;

        let client = TapClient::new(TapConfig::new(server.url(), "sk_test", "m1"));
        let request = CaptureRequest {
            authorize_id: "auth_1".into(),
            amount: 10.0,
            currency: "USD".into(),
            order_ref: None,
            idempotency_key: Some("client-key-9".into()),
        };
        client.capture(&request).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_authorization_percent_encodes_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/authorize/auth%201")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"auth 1","status":"AUTHORIZED","amount":10,"currency":"USD"}"#)
            .create_async()
            .await;

        let client = TapClient::new(TapConfig::new(server.url(), "sk_test", "m1"));
        let reply = client.fetch_authorization("auth 1").await.unwrap();

        mock.assert_async().await;
        assert!(matches!(reply, GatewayReply::Accepted(auth) if auth.status == "AUTHORIZED"));
    }

    #[tokio::test]
    async fn transport_failure_is_a_generic_error() {
        let client = unreachable_client();
        let result = client
            .authorize(&authorize_request(PaymentSource::Token("tok_test".into()), 10.0))
            .await;
        assert!(matches!(result, Err(TapError::Transport(_))));
    }
}
