//! Gateway-facing trait for the four remote operations.
//!
//! [`TapClient`](crate::client::TapClient) is the production implementation;
//! the finalization sequencer is generic over this trait so its branching can
//! be exercised against a fake gateway in tests.

use crate::error::TapError;
use crate::payment::{AuthorizeRequest, Card, CaptureRequest};
use crate::response::{Authorization, Capture, GatewayReply, Token};

/// The remote operations the checkout flow needs. Each call performs exactly
/// one outbound request (authorize performs two when a raw card is supplied).
pub trait PaymentGateway: Send + Sync {
    /// Convert raw card details into a one-time opaque token.
    fn tokenize(
        &self,
        card: &Card,
        client_ip: Option<&str>,
    ) -> impl std::future::Future<Output = Result<GatewayReply<Token>, TapError>> + Send;

    /// Reserve funds against a token or card, with 3-D-Secure enabled.
    fn authorize(
        &self,
        request: &AuthorizeRequest,
    ) -> impl std::future::Future<Output = Result<GatewayReply<Authorization>, TapError>> + Send;

    /// Convert an authorization into an actual charge.
    fn capture(
        &self,
        request: &CaptureRequest,
    ) -> impl std::future::Future<Output = Result<GatewayReply<Capture>, TapError>> + Send;

    /// Read-only lookup of an authorization by id. No side effects.
    fn fetch_authorization(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<GatewayReply<Authorization>, TapError>> + Send;
}
