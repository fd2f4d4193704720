//! HTTP API handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::{info, warn};

use crate::metrics;
use crate::relay::{
    IncomingMessageRequest, MessageSendResult, RelayFlag, TelegramNotifier, YclientsCatalog,
};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Review notifier.
    pub notifier: Arc<TelegramNotifier>,
    /// Service catalog client.
    pub catalog: Arc<YclientsCatalog>,
    /// Prometheus handle, when the recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(notifier: TelegramNotifier, catalog: YclientsCatalog) -> Self {
        Self {
            notifier: Arc::new(notifier),
            catalog: Arc::new(catalog),
            metrics: None,
        }
    }

    /// Attach the Prometheus handle served on `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Prometheus exposition handler.
pub async fn metrics_page(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Relay entry point.
///
/// `send_review` in the query selects the notifier; everything else, including
/// requests with unrelated or malformed query strings, goes to the catalog.
/// A body that cannot be read (over the size limit, aborted upload) is treated
/// as empty so the relay still answers with its usual JSON.
pub async fn relay(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let flag = RelayFlag::from_query(query.as_deref());
    metrics::inc_relay_requests(flag);

    let body = body.unwrap_or_else(|rejection| {
        warn!(error = %rejection, "Request body unreadable, treating as empty");
        Bytes::new()
    });

    match flag {
        RelayFlag::SendReview => send_review(&state, &body).await.into_response(),
        RelayFlag::Catalog => catalog(&state).await,
    }
}

/// Forward the review and acknowledge, whatever Telegram says.
async fn send_review(state: &AppState, body: &[u8]) -> Json<MessageSendResult> {
    let request = IncomingMessageRequest::from_body(body);

    if let Err(e) = state.notifier.send_message(&request.msg).await {
        warn!(error = %e, "Review notification failed");
    } else {
        info!(len = request.msg.len(), "Review relayed");
    }

    Json(MessageSendResult::ok())
}

/// Forward the upstream catalog body byte-for-byte.
async fn catalog(state: &AppState) -> Response {
    match state.catalog.fetch_services().await {
        Ok(response) => (
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            response.body,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Catalog fetch failed");
            e.into_response()
        }
    }
}
