//! YCLIENTS service catalog client.

use std::time::Instant;

use axum::body::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, Secret};
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::metrics;

use super::{build_http_client, Upstream};

/// Media type the YCLIENTS v2 API answers with.
pub const YCLIENTS_ACCEPT: &str = "application/vnd.yclients.v2+json";

/// Raw catalog answer, forwarded to the browser untouched.
#[derive(Debug, Clone)]
pub struct CatalogResponse {
    /// Upstream HTTP status, kept for logging only.
    pub status: StatusCode,
    /// Upstream body bytes.
    pub body: Bytes,
}

/// Fetches the service list of one branch.
#[derive(Debug, Clone)]
pub struct YclientsCatalog {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Booking API base URL.
    api_url: String,
    /// Partner bearer token.
    partner_token: Secret<String>,
    /// Branch whose services are listed.
    branch_id: u64,
}

impl YclientsCatalog {
    /// Create a catalog client from config.
    pub fn new(config: &Config) -> Result<Self> {
        let http = build_http_client(config.upstream_timeout(), config.connect_timeout())?;

        Ok(Self {
            http,
            api_url: config.yclients_api_url.trim_end_matches('/').to_string(),
            partner_token: config.yclients_partner_token.clone(),
            branch_id: config.yclients_branch_id,
        })
    }

    /// Branch id the catalog is fetched for.
    pub fn branch_id(&self) -> u64 {
        self.branch_id
    }

    /// Services endpoint for the configured branch.
    pub fn services_url(&self) -> String {
        format!("{}/api/v1/services/{}", self.api_url, self.branch_id)
    }

    /// Fetch the branch service list.
    ///
    /// Only transport failures are errors. Any HTTP status, including 4xx/5xx,
    /// comes back as a [`CatalogResponse`] with the body intact.
    #[instrument(skip(self), fields(branch_id = self.branch_id))]
    pub async fn fetch_services(&self) -> Result<CatalogResponse> {
        let start = Instant::now();
        let result = self.request().await;
        metrics::record_upstream_latency(start, Upstream::Yclients);

        let response = result.map_err(|e| {
            let err = RelayError::from_transport(Upstream::Yclients, e);
            metrics::inc_upstream_errors(Upstream::Yclients, err.kind());
            err
        })?;

        if response.status.is_success() {
            debug!(status = %response.status, bytes = response.body.len(), "Catalog fetched");
        } else {
            warn!(status = %response.status, "Catalog upstream returned an error status, forwarding body");
        }

        Ok(response)
    }

    async fn request(&self) -> std::result::Result<CatalogResponse, reqwest::Error> {
        let response = self
            .http
            .get(self.services_url())
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.partner_token.expose_secret()),
            )
            .header(ACCEPT, YCLIENTS_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        Ok(CatalogResponse { status, body })
    }
}
