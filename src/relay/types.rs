//! Bodies exchanged with the browser.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Query key that selects the review notifier.
pub const SEND_REVIEW_FLAG: &str = "send_review";

/// Review submitted by the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IncomingMessageRequest {
    /// Message text, sent as-is.
    #[serde(default, deserialize_with = "msg_as_text")]
    pub msg: String,
}

impl IncomingMessageRequest {
    /// Parse a request body leniently.
    ///
    /// Anything that is not a JSON object yields an empty message instead of an
    /// error.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

/// Accept any JSON value for `msg`.
///
/// Scalars become text the way a form field would carry them: numbers in their
/// JSON spelling, `true` as `"1"`, `false` and `null` as `""`. Arrays and
/// objects have no text form and also become `""`.
fn msg_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "1".to_string(),
        _ => String::new(),
    };
    Ok(text)
}

/// Acknowledgment returned by the notifier relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSendResult {
    /// Always "ok".
    pub status: &'static str,
}

impl MessageSendResult {
    /// The only acknowledgment the notifier sends.
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

/// Transport failure reported by the catalog relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogErrorBody {
    /// Human-readable failure.
    pub error: String,
}

/// Which relay a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayFlag {
    /// Forward the body's `msg` to Telegram.
    SendReview,
    /// Fetch the branch service list.
    Catalog,
}

impl RelayFlag {
    /// Decide from a raw query string.
    ///
    /// The flag only has to be present; its value is ignored. Malformed query
    /// strings never fail, they just route to the catalog.
    pub fn from_query(query: Option<&str>) -> Self {
        let present = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes()).any(|(key, _)| key == SEND_REVIEW_FLAG)
            })
            .unwrap_or(false);

        if present {
            RelayFlag::SendReview
        } else {
            RelayFlag::Catalog
        }
    }
}
