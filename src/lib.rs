//! Browser-facing relay for a salon website.
//!
//! One endpoint hides two third-party credentials from the browser:
//!
//! ```text
//! GET/POST /?send_review   {"msg": "..."}  ──▶ Telegram sendMessage   ──▶ {"status":"ok"}
//! GET      /                               ──▶ YCLIENTS services list ──▶ upstream body, verbatim
//! ```
//!
//! The review relay is fire-and-forget: the browser always gets `{"status":"ok"}`.
//! The catalog relay only reports transport failures, as `{"error": "..."}`.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`relay`]: Telegram and YCLIENTS clients
//! - [`api`]: HTTP router, relay entry point, health and metrics
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod relay;
pub mod utils;

pub use config::Config;
pub use error::{RelayError, Result};
