//! Application configuration loaded from environment variables.

use std::time::Duration;

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use url::Url;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Telegram (review notifications) ===
    /// Bot API token used in the `sendMessage` URL path.
    pub telegram_bot_token: Secret<String>,

    /// Chat that receives the reviews.
    pub telegram_chat_id: String,

    /// Bot API base URL.
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    // === YCLIENTS (service catalog) ===
    /// Partner token sent as a bearer credential.
    pub yclients_partner_token: Secret<String>,

    /// Branch whose services are listed.
    pub yclients_branch_id: u64,

    /// Booking platform base URL.
    #[serde(default = "default_yclients_api_url")]
    pub yclients_api_url: String,

    // === Upstream limits ===
    /// Total time allowed for one upstream call.
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,

    /// Time allowed to establish the upstream connection.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    // === Server Configuration ===
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the relay endpoint.
    #[serde(default = "default_relay_path")]
    pub relay_path: String,

    /// Value of `Access-Control-Allow-Origin` on every response.
    #[serde(default = "default_cors_origin")]
    pub cors_allow_origin: String,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_yclients_api_url() -> String {
    "https://api.yclients.com".to_string()
}

fn default_upstream_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    3_000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_relay_path() -> String {
    "/".to_string()
}

fn default_cors_origin() -> String {
    "*".to_string()
}

/// Paths served next to the relay endpoint.
const RESERVED_PATHS: [&str; 2] = ["/health", "/metrics"];

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.telegram_bot_token.expose_secret().trim().is_empty() {
            return Err("TELEGRAM_BOT_TOKEN is required".to_string());
        }

        if self.telegram_chat_id.trim().is_empty() {
            return Err("TELEGRAM_CHAT_ID is required".to_string());
        }

        if self.yclients_partner_token.expose_secret().trim().is_empty() {
            return Err("YCLIENTS_PARTNER_TOKEN is required".to_string());
        }

        check_base_url("TELEGRAM_API_URL", &self.telegram_api_url)?;
        check_base_url("YCLIENTS_API_URL", &self.yclients_api_url)?;

        if self.upstream_timeout_ms == 0 {
            return Err("UPSTREAM_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.connect_timeout_ms == 0 {
            return Err("CONNECT_TIMEOUT_MS must be greater than 0".to_string());
        }

        if !self.relay_path.starts_with('/') {
            return Err("RELAY_PATH must start with '/'".to_string());
        }

        if RESERVED_PATHS.contains(&self.relay_path.as_str()) {
            return Err(format!("RELAY_PATH cannot be {}", self.relay_path));
        }

        if self.cors_allow_origin != "*" && self.cors_allow_origin.parse::<Url>().is_err() {
            return Err("CORS_ALLOW_ORIGIN must be '*' or an origin URL".to_string());
        }

        Ok(())
    }

    /// Total upstream call timeout.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    /// Upstream connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// `host:port` to bind the HTTP server on.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn check_base_url(name: &str, value: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|e| format!("{} is not a valid URL: {}", name, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("{} must use http or https, got {}", name, other)),
    }
}
