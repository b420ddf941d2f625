use actix_web::{HttpResponse, ResponseError};
use tap_checkout::TapError;

/// Errors surfaced by the HTTP layer.
///
/// Gateway rejections never land here; handlers pass the remote status code
/// and body through directly. This type covers the two cases where no remote
/// reply exists: input rejected before any gateway call, and transport
/// failures with no reachable response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input; the payload is a short machine-readable
    /// reason, e.g. `invalid_amount`.
    #[error("{0}")]
    Validation(&'static str),

    /// The gateway was unreachable or the call failed without a response.
    #[error("{op}_failed: {detail}")]
    Upstream { op: &'static str, detail: String },
}

impl ApiError {
    /// Attach the failing operation's name to a core error.
    pub fn from_tap(op: &'static str, err: TapError) -> Self {
        match err {
            TapError::Validation(reason) => ApiError::Validation(reason),
            TapError::Transport(detail) => ApiError::Upstream { op, detail },
            TapError::Decode(e) => ApiError::Upstream {
                op,
                detail: e.to_string(),
            },
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Validation(reason) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": reason,
            })),
            ApiError::Upstream { op, detail } => {
                tracing::error!(op, detail = %detail, "gateway call failed");
                HttpResponse::BadGateway().json(serde_json::json!({
                    "error": format!("{op}_failed"),
                    "detail": detail,
                }))
            }
        }
    }
}
