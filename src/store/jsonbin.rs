use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error};

use crate::config::{self, StoreConfig};
use crate::error::{PartyError, Result};
use crate::models::AppState;
use crate::store::StateBackend;

const ACCESS_KEY_HEADER: &str = "X-Access-Key";

/// JSONBin wraps every document in `{ "record": ... }`. A missing or `null`
/// record reads as absent.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    record: Option<AppState>,
}

/// Error bodies carry either `message` or `error`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// [`StateBackend`] over a JSONBin v3 bin.
#[derive(Debug, Clone)]
pub struct JsonBinBackend {
    config: Option<StoreConfig>,
    base_url: String,
    client: Client,
}

impl JsonBinBackend {
    /// Create a backend for `config`. A missing or placeholder config yields an
    /// unconfigured backend rather than an error.
    pub fn new(config: Option<StoreConfig>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            config: config.filter(StoreConfig::is_usable),
            base_url: config::JSONBIN_BASE.to_string(),
            client,
        })
    }

    /// Point the backend at a different API root (self-hosted or test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn bin_url(&self) -> Option<String> {
        self.config
            .as_ref()
            .map(|c| format!("{}/b/{}", self.base_url, c.bin_id))
    }

    fn credentials(&self) -> Result<&StoreConfig> {
        self.config.as_ref().ok_or(PartyError::NotConfigured)
    }
}

impl StateBackend for JsonBinBackend {
    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn get(&self) -> Result<Option<AppState>> {
        let creds = self.credentials()?;
        let url = format!("{}/b/{}/latest", self.base_url, creds.bin_id);
        debug!(%url, "fetching party state");

        let resp = self
            .client
            .get(&url)
            .header(ACCESS_KEY_HEADER, &creds.access_key)
            .send()?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = check_status(resp, &url)?;
        let envelope: Envelope = resp.json()?;
        Ok(Some(envelope.record.unwrap_or_default()))
    }

    fn put(&self, state: &AppState) -> Result<AppState> {
        let creds = self.credentials()?;
        let url = format!("{}/b/{}", self.base_url, creds.bin_id);
        debug!(%url, "writing party state");

        let resp = self
            .client
            .put(&url)
            .header(ACCESS_KEY_HEADER, &creds.access_key)
            .json(state)
            .send()?;

        let resp = check_status(resp, &url)?;
        let envelope: Envelope = resp.json()?;
        // an empty confirmation means the document was stored as sent
        Ok(envelope.record.unwrap_or_else(|| state.clone()))
    }
}

fn check_status(resp: Response, url: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    error!(%url, status = status.as_u16(), body = %body, "JSONBin request failed");
    Err(status_error(status, &body))
}

/// Map a failed JSONBin response to a user-facing error.
pub(crate) fn status_error(status: StatusCode, body: &str) -> PartyError {
    match status {
        StatusCode::UNAUTHORIZED => PartyError::unauthorized(),
        StatusCode::FORBIDDEN => PartyError::forbidden(),
        StatusCode::NOT_FOUND => PartyError::bin_not_found(),
        StatusCode::BAD_REQUEST => PartyError::BadRequest(
            body_message(body).unwrap_or_else(|| "Invalid data format".to_string()),
        ),
        _ => {
            let message = body_message(body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });
            PartyError::Status {
                status: status.as_u16(),
                message,
            }
        }
    }
}

/// The `message` (or `error`) field of a JSON error body, else the trimmed
/// raw text. `None` for an empty body.
fn body_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .or_else(|| Some(body.trim().to_string()))
        .filter(|s| !s.trim().is_empty())
}
