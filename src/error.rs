//! Unified error types for the relay.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::relay::{CatalogErrorBody, Upstream};

/// Unified error type for the relay.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The upstream did not answer within the configured timeout.
    #[error("{upstream} timed out")]
    UpstreamTimeout {
        /// Upstream that timed out.
        upstream: Upstream,
    },

    /// The upstream could not be reached or the response could not be read.
    #[error("{upstream} unreachable: {reason}")]
    UpstreamUnreachable {
        /// Upstream that failed.
        upstream: Upstream,
        /// Transport-level reason.
        reason: String,
    },

    /// HTTP client construction error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl RelayError {
    /// Classify a transport failure talking to `upstream`.
    pub fn from_transport(upstream: Upstream, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return RelayError::UpstreamTimeout { upstream };
        }

        // Strip the URL: the Telegram one embeds the bot token.
        let err = err.without_url();
        let mut reason = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            reason.push_str(": ");
            reason.push_str(&cause.to_string());
            source = cause.source();
        }

        RelayError::UpstreamUnreachable { upstream, reason }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::InvalidConfig(_) => "config",
            RelayError::UpstreamTimeout { .. } => "timeout",
            RelayError::UpstreamUnreachable { .. } => "unreachable",
            RelayError::Http(_) => "http",
        }
    }

    /// HTTP status reported to the browser.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            RelayError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = CatalogErrorBody {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, RelayError>;
