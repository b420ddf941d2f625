//! Finalization sequencing: authorize → (optional 3-D-Secure redirect) →
//! capture.
//!
//! Linear and retry-free. Every branch either finishes or hands control back
//! to the caller; the only replay protection is the stable idempotency key
//! sent with capture. A pending 3-D-Secure challenge ends the in-process
//! leg; the flow resumes via [`FinalizationSequencer::resume`] once the
//! browser has returned.

use serde::Serialize;
use serde_json::Value;

use crate::error::TapError;
use crate::gateway::PaymentGateway;
use crate::payment::{AuthorizeRequest, CaptureRequest};
use crate::response::{Authorization, Capture, GatewayReply, STATUS_AUTHORIZED, STATUS_CAPTURED};

/// Where in the flow a failure was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizeStage {
    Authorize,
    Capture,
}

/// Terminal outcome of one finalization leg.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Finalization {
    /// A 3-D-Secure challenge is pending. The browser must follow
    /// `transaction_url`; the flow resumes out-of-process.
    PendingRedirect {
        authorize_id: String,
        transaction_url: String,
    },
    /// Funds were captured.
    Captured { capture: Capture },
    /// The flow stopped. `status` is the gateway status observed, rendered
    /// verbatim; `detail` is the raw payload for caller inspection.
    Failed {
        stage: FinalizeStage,
        status: Option<String>,
        detail: Value,
    },
}

/// Decides, after each gateway reply, whether further action is needed and
/// what. Generic over [`PaymentGateway`] so the branching can be exercised
/// against a fake gateway.
pub struct FinalizationSequencer<G> {
    gateway: G,
}

impl<G: PaymentGateway> FinalizationSequencer<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// First leg: authorize, then either hand back the challenge redirect,
    /// capture immediately, or stop with the observed status.
    pub async fn begin(&self, request: &AuthorizeRequest) -> Result<Finalization, TapError> {
        let auth = match self.gateway.authorize(request).await? {
            GatewayReply::Accepted(auth) => auth,
            GatewayReply::Rejected { body, .. } => {
                return Ok(failed(FinalizeStage::Authorize, status_of(&body), body));
            }
        };

        // The challenge takes precedence even when the status already reads
        // AUTHORIZED: capture must wait until the redirect completes.
        if let Some(url) = &auth.transaction_url {
            return Ok(Finalization::PendingRedirect {
                authorize_id: auth.id.clone(),
                transaction_url: url.clone(),
            });
        }

        if auth.status != STATUS_AUTHORIZED {
            let status = Some(auth.status.clone());
            return Ok(failed(FinalizeStage::Authorize, status, auth.raw));
        }

        // The gateway echoes the authorized amount; fall back to the
        // requested one when it does not.
        let amount = if auth.amount > 0.0 {
            auth.amount
        } else {
            request.amount
        };
        self.capture_authorized(&auth, amount).await
    }

    /// Second leg, after the browser returned from the 3-D-Secure challenge:
    /// re-fetch the authorization, then capture or stop.
    pub async fn resume(&self, authorize_id: &str) -> Result<Finalization, TapError> {
        let auth = match self.gateway.fetch_authorization(authorize_id).await? {
            GatewayReply::Accepted(auth) => auth,
            GatewayReply::Rejected { body, .. } => {
                return Ok(failed(FinalizeStage::Authorize, status_of(&body), body));
            }
        };

        if auth.status != STATUS_AUTHORIZED {
            let status = Some(auth.status.clone());
            return Ok(failed(FinalizeStage::Authorize, status, auth.raw));
        }

        let amount = auth.amount;
        self.capture_authorized(&auth, amount).await
    }

    /// Shared capture leg. Captures exactly the authorized amount and
    /// currency, so capture-amount == authorized-amount holds whenever this
    /// sequencer drives the capture.
    async fn capture_authorized(
        &self,
        auth: &Authorization,
        amount: f64,
    ) -> Result<Finalization, TapError> {
        let request = CaptureRequest {
            authorize_id: auth.id.clone(),
            amount,
            currency: auth.currency.clone(),
            order_ref: auth.order_ref.clone(),
            idempotency_key: None,
        };

        let capture = match self.gateway.capture(&request).await? {
            GatewayReply::Accepted(capture) => capture,
            GatewayReply::Rejected { body, .. } => {
                return Ok(failed(FinalizeStage::Capture, status_of(&body), body));
            }
        };

        if capture.status == STATUS_CAPTURED {
            Ok(Finalization::Captured { capture })
        } else {
            let status = Some(capture.status.clone());
            Ok(failed(FinalizeStage::Capture, status, capture.raw))
        }
    }
}

fn failed(stage: FinalizeStage, status: Option<String>, detail: Value) -> Finalization {
    Finalization::Failed {
        stage,
        status,
        detail,
    }
}

fn status_of(body: &Value) -> Option<String> {
    body.get("status")
        .and_then(Value::as_str)
        .map(str::to_string)
}
