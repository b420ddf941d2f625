use tap_checkout::{FinalizationSequencer, TapClient};

/// Shared application state for the checkout server.
pub struct AppState {
    pub tap: TapClient,
    pub sequencer: FinalizationSequencer<TapClient>,
    /// Public-facing base used to build the 3-D-Secure return link.
    pub web_base_url: String,
    /// Secret for webhook signature verification. `None` = log-only webhooks.
    pub webhook_secret: Option<Vec<u8>>,
    /// Bearer token required for `/metrics`. `None` = public.
    pub metrics_token: Option<String>,
}
