//! The single HTTP GET primitive shared by the feed reader and the batch scraper.
//!
//! # Architecture
//!
//! - [`Fetch`]: Core trait defining one async GET
//! - [`HttpFetcher`]: `reqwest` implementation with a fixed timeout and
//!   certificate verification disabled
//!
//! The fetcher never retries. A non-success status becomes
//! [`FetchError::Http`], anything below the HTTP layer becomes
//! [`FetchError::Network`]; what to do with either is the caller's decision.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors returned by a [`Fetch`] implementation.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("{} {} Error: {} for url: {}", .status, status_class(.status), .reason, .url)]
    Http {
        status: u16,
        reason: String,
        url: String,
    },
    /// Connection, TLS, timeout or body-read failure.
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    pub(crate) fn from_status(status: StatusCode, url: &str) -> Self {
        FetchError::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            url: url.to_string(),
        }
    }
}

fn status_class(status: &u16) -> &'static str {
    match *status {
        400..=499 => "Client",
        500..=599 => "Server",
        _ => "Unexpected",
    }
}

/// A successful response body.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub bytes: Vec<u8>,
    /// The `charset` parameter of the `Content-Type` header, if any.
    pub declared_encoding: Option<String>,
}

/// Trait for fetching one URL.
///
/// The batch driver and the feed reader only depend on this trait, which
/// lets tests drive them without a network.
///
/// Callers await the returned future on the current task, so no `Send` bound
/// is promised; test doubles may hold `RefCell` state.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<FetchedBody, FetchError>;
}

/// `reqwest`-backed [`Fetch`] implementation.
///
/// Certificate validation is disabled for every request: the scrape does not
/// care whether the target's certificate chain is trusted.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedBody, FetchError> {
        let t0 = Instant::now();
        let network = |source: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, elapsed_ms = t0.elapsed().as_millis(), "Non-success status");
            return Err(FetchError::from_status(status, url));
        }

        let declared_encoding = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_param);
        let bytes = response.bytes().await.map_err(network)?.to_vec();

        debug!(
            bytes = bytes.len(),
            ?declared_encoding,
            elapsed_ms = t0.elapsed().as_millis(),
            "Fetched"
        );
        Ok(FetchedBody {
            bytes,
            declared_encoding,
        })
    }
}

/// Extract the `charset` parameter from a `Content-Type` value.
fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    })
}
