//! HTTP surface for the Tap checkout glue.
//!
//! Every route is a thin proxy over the core `tap-checkout` crate: requests
//! are validated, handed to the gateway client or the finalization
//! sequencer, and replies are reshaped with the remote status code and body
//! passed through for caller-side debugging.
//!
//! # Modules
//!
//! - [`routes`] — token / authorize / capture / fetch / finalize endpoints
//! - [`webhook`] — raw-body webhook receiver with optional signature check
//! - [`config`] — environment-sourced [`ServerConfig`](config::ServerConfig)
//! - [`state`] — shared [`AppState`](state::AppState)
//! - [`metrics`] — Prometheus counters and histograms
//! - [`cors`] — CORS middleware construction

pub mod config;
pub mod cors;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod webhook;
