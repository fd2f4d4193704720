//! Telegram Bot API notifier.

use std::time::Instant;

use secrecy::{ExposeSecret, Secret};
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::metrics;

use super::{build_http_client, Upstream};

/// Sends review text to a fixed Telegram chat.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Bot API base URL.
    api_url: String,
    /// Bot token, part of the request path.
    token: Secret<String>,
    /// Destination chat.
    chat_id: String,
}

impl TelegramNotifier {
    /// Create a notifier from config.
    pub fn new(config: &Config) -> Result<Self> {
        let http = build_http_client(config.upstream_timeout(), config.connect_timeout())?;

        Ok(Self {
            http,
            api_url: config.telegram_api_url.trim_end_matches('/').to_string(),
            token: config.telegram_bot_token.clone(),
            chat_id: config.telegram_chat_id.clone(),
        })
    }

    /// Destination chat id.
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Send `text` to the configured chat.
    ///
    /// The response body is discarded and a non-2xx status is only logged:
    /// callers treat delivery as fire-and-forget.
    #[instrument(skip(self, text), fields(chat_id = %self.chat_id, len = text.len()))]
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_url,
            self.token.expose_secret()
        );

        let start = Instant::now();
        let result = self
            .http
            .get(&url)
            .query(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await;
        metrics::record_upstream_latency(start, Upstream::Telegram);

        let response = result.map_err(|e| {
            let err = RelayError::from_transport(Upstream::Telegram, e);
            metrics::inc_upstream_errors(Upstream::Telegram, err.kind());
            err
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "Review delivered");
        } else {
            warn!(%status, "Telegram rejected sendMessage");
            metrics::inc_upstream_errors(Upstream::Telegram, "status");
        }

        Ok(())
    }
}
