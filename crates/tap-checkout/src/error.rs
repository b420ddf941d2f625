use thiserror::Error;

/// Errors returned by gateway operations.
///
/// Non-2xx gateway replies are not errors; they come back as
/// [`GatewayReply::Rejected`](crate::response::GatewayReply) so the remote
/// status code and body can be passed through verbatim.
#[derive(Debug, Error)]
pub enum TapError {
    /// Input rejected before any network call was made. The payload is a
    /// short machine-readable reason, e.g. `invalid_amount`.
    #[error("invalid request: {0}")]
    Validation(&'static str),

    /// The gateway was unreachable or the call failed without a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The gateway answered with a body that could not be decoded as JSON.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
