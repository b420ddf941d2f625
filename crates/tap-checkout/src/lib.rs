//! Payment glue for the Tap gateway.
//!
//! Connects a web checkout frontend to the Tap REST API: card tokenization,
//! 3-D-Secure authorization, server-side capture, and the sequencing between
//! them. The service is stateless: every payment is fully described by the
//! identifiers the gateway returns, re-fetched as needed.
//!
//! # Two components
//!
//! - [`TapClient`] — builds and sends the tokenize / authorize / capture /
//!   fetch requests and normalizes replies into [`GatewayReply`] values
//! - [`FinalizationSequencer`] — decides after each reply whether to hand the
//!   browser a 3-D-Secure redirect, capture immediately, or stop
//!
//! The HTTP surface lives in the `tap-checkout-server` crate.

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod payment;
pub mod response;
pub mod sequencer;
pub mod signature;

pub use client::{capture_idempotency_key, TapClient};
pub use config::TapConfig;
pub use error::TapError;
pub use gateway::PaymentGateway;
pub use payment::{AuthorizeRequest, Card, CaptureRequest, Customer, PaymentSource};
pub use response::{
    Authorization, Capture, GatewayReply, Token, STATUS_AUTHORIZED, STATUS_CAPTURED,
};
pub use sequencer::{Finalization, FinalizationSequencer, FinalizeStage};
