//! # photogrid-fetcher
//!
//! Retrieves and parses a gallery's remote manifest document.
//!
//! Every fetch bypasses intermediate response caches: a `t=<unix-millis>`
//! query parameter is appended to the manifest URL and `Cache-Control:
//! no-store` / `Pragma: no-cache` request headers are sent, so a static host
//! (or a CDN in front of one) cannot serve a stale manifest.
//!
//! Shape problems in the body are NOT fetch errors: the tolerant parsing in
//! [`Manifest::parse`] degrades a missing or malformed `photos` field to an
//! empty list. Only transport failures, non-2xx statuses, and bodies that are
//! not JSON at all surface as [`FetchError`].

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::blocking::Client;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Url;
use thiserror::Error;

use photogrid_core::Manifest;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
const CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// All errors that can arise from manifest retrieval.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The configured manifest URL cannot be used.
    #[error("invalid manifest URL '{url}': {reason}")]
    Url { url: String, reason: String },

    /// The server answered with a non-success HTTP status.
    #[error("failed to fetch manifest (HTTP {status})")]
    Transport { status: u16 },

    /// Transport-level failure: DNS, refused connection, timeout, TLS.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body is not valid JSON.
    #[error("manifest parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fetches and parses the manifest for one gallery.
///
/// Construct once per gallery and reuse; the underlying [`Client`] holds the
/// connection pool.
#[derive(Debug)]
pub struct ManifestFetcher {
    client: Client,
    url: Url,
}

impl ManifestFetcher {
    /// Build a fetcher for `manifest_url`.
    ///
    /// Fails with [`FetchError::Url`] when the URL does not parse or is not
    /// http(s).
    pub fn new(manifest_url: &str) -> Result<Self, FetchError> {
        let url = Url::parse(manifest_url).map_err(|e| FetchError::Url {
            url: manifest_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::Url {
                url: manifest_url.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("photogrid/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(ManifestFetcher { client, url })
    }

    /// The manifest URL this fetcher was built with (without cache-bust param).
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch the manifest, bypassing caches.
    ///
    /// One network round-trip per call. Returns [`FetchError::Transport`] on
    /// a non-2xx response, [`FetchError::Parse`] when the body is not JSON.
    pub fn fetch(&self) -> Result<Manifest, FetchError> {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("t", &unix_millis().to_string());

        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport {
                status: status.as_u16(),
            });
        }

        let body = response.text()?;
        Ok(Manifest::parse(&body)?)
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
