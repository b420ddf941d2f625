//! CORS configuration for the checkout server.

use actix_cors::Cors;
use actix_web::http::header;

/// Build the CORS middleware from the allowed-origin list. The checkout
/// widget sends credentialed requests, so origins are matched exactly rather
/// than wildcarded at the header level.
pub fn build_cors(allowed_origins: &[String]) -> Cors {
    let allowed = allowed_origins.to_vec();
    Cors::default()
        .allowed_origin_fn(move |origin, _req_head| {
            let origin_str = origin.to_str().unwrap_or("");
            allowed.iter().any(|a| a == "*" || a == origin_str)
        })
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("idempotency-key"),
            header::HeaderName::from_static("x-tap-signature"),
        ])
        .supports_credentials()
        .max_age(3600)
}
