//! Upstream relays.
//!
//! - [`notifier`]: review notifications through the Telegram Bot API
//! - [`catalog`]: branch service list from the YCLIENTS booking API
//! - [`types`]: request/response bodies shared with the HTTP layer

pub mod catalog;
pub mod notifier;
pub mod types;

use std::time::Duration;

use strum::{AsRefStr, Display};

pub use catalog::{CatalogResponse, YclientsCatalog};
pub use notifier::TelegramNotifier;
pub use types::{CatalogErrorBody, IncomingMessageRequest, MessageSendResult, RelayFlag};

/// Third-party API a relay talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Upstream {
    /// Telegram Bot API.
    Telegram,
    /// YCLIENTS booking platform.
    Yclients,
}

/// Build the pooled HTTP client used for one upstream.
pub(crate) fn build_http_client(
    timeout: Duration,
    connect_timeout: Duration,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .tcp_nodelay(true)
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(concat!("salon-relay/", env!("CARGO_PKG_VERSION")))
        .build()
}
