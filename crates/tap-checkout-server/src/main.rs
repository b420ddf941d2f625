use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tap_checkout::{FinalizationSequencer, TapClient};
use tap_checkout_server::config::ServerConfig;
use tap_checkout_server::state::AppState;
use tap_checkout_server::{cors, routes, webhook};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            std::process::exit(1);
        }
    };
    tracing::debug!(?config, "configuration loaded");

    let tap = TapClient::new(config.tap_config());
    let state = web::Data::new(AppState {
        sequencer: FinalizationSequencer::new(tap.clone()),
        tap,
        web_base_url: config.web_base_url.clone(),
        webhook_secret: config.webhook_secret.clone(),
        metrics_token: config.metrics_token.clone(),
    });

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(config.rate_limit_rpm)
        .finish()
        .expect("failed to build rate limiter config");

    let port = config.port;
    tracing::info!(port, "tap-checkout server listening");
    tracing::info!("Rate limit: {} req/min per IP", config.rate_limit_rpm);
    tracing::info!("  POST http://localhost:{port}/api/tap/webhook");
    tracing::info!("  POST http://localhost:{port}/api/tap/token");
    tracing::info!("  POST http://localhost:{port}/api/tap/authorize");
    tracing::info!("  POST http://localhost:{port}/api/tap/capture");
    tracing::info!("  GET  http://localhost:{port}/api/tap/authorize/{{id}}");
    tracing::info!("  POST http://localhost:{port}/api/tap/finalize");
    tracing::info!("  POST http://localhost:{port}/api/tap/finalize/resume");

    let allowed_origins = config.allowed_origins.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(cors::build_cors(&allowed_origins))
            .wrap(Governor::new(&governor_conf))
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(65_536))
            .service(webhook::webhook)
            .service(routes::token)
            .service(routes::authorize)
            .service(routes::capture)
            .service(routes::fetch_authorize)
            .service(routes::finalize)
            .service(routes::finalize_resume)
            .service(routes::health)
            .service(routes::metrics_endpoint)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
