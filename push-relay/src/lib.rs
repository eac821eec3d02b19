//! # zeropush-relay
//!
//! Zero-knowledge push relay for APNs and FCM.
//!
//! This crate implements a relay server that:
//! - Accepts batches of opaque push envelopes over HTTP
//! - Opens each RSA-sealed push identifier with its private key
//! - Hands the envelope to the first provider able to reach the device
//! - Never sees plaintext (envelopes are forwarded as-is)
//!
//! ## Architecture
//!
//! ```text
//!  App server ──┐                         ┌── APNs gateway
//!               │  POST /v1/push          │
//!               ├──────────────┐      ┌───┤
//!               │              ▼      │   └── FCM endpoint
//!        ┌──────┴──────────────────────┴───┐
//!        │           zeropush              │
//!        │  RelayKey → codec → dispatchers │
//!        └─────────────────────────────────┘
//! ```
//!
//! ## Dispatch
//!
//! Dispatchers are tried in configuration order (APNs certificates,
//! development APNs certificates, FCM credentials). The first one that
//! accepts the destination and delivers wins; if every capable one fails,
//! the last failure is reported.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod keys;
pub mod logging;
pub mod manager;
pub mod server;

pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::{PushError, PushResult, RelayError};
pub use keys::{RelayKey, RelayPublicKey};
pub use manager::DispatchManager;
pub use server::PushRelay;
