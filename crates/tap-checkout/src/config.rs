/// Immutable gateway configuration, constructed once at startup and handed to
/// [`TapClient`](crate::client::TapClient). No part of the client reads the
/// environment, so tests can point this at a fake gateway.
#[derive(Clone)]
pub struct TapConfig {
    /// Gateway REST base, e.g. `https://api.tap.company/v2`.
    pub api_base: String,
    /// Secret bearer credential sent on every gateway call.
    pub secret_key: String,
    /// Merchant identifier attached to authorize and charge requests.
    pub merchant_id: String,
}

impl TapConfig {
    pub fn new(
        api_base: impl Into<String>,
        secret_key: impl Into<String>,
        merchant_id: impl Into<String>,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
            merchant_id: merchant_id.into(),
        }
    }
}

impl std::fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapConfig")
            .field("api_base", &self.api_base)
            .field("secret_key", &"[REDACTED]")
            .field("merchant_id", &self.merchant_id)
            .finish()
    }
}
