//! Rate-limited HTTP client.
//!
//! Wraps a [`reqwest::Client`] behind the shared token bucket: every GET
//! first takes a token, so the bucket's rate and burst settings bound the
//! whole run's request rate no matter how many fetch tasks are in flight.

use super::{FetchOutcome, FetcherError, FetcherResult, PageFetcher};
use crate::downloader::rate_limit::RateLimiter;
use crate::metrics::RequestMetrics;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONNECTION};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client that funnels every request through a shared token bucket.
pub struct RatedClient {
    client: Client,
    limiter: Arc<RateLimiter>,
}

impl RatedClient {
    /// Build a client requesting non-persistent connections.
    ///
    /// `timeout` of `None` lets a request wait indefinitely; the underlying
    /// transport then only fails on connection-level errors.
    pub fn new(limiter: Arc<RateLimiter>, timeout: Option<Duration>) -> FetcherResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FetcherError::InvalidRequest(e.to_string()))?;

        Ok(Self { client, limiter })
    }
}

#[async_trait]
impl PageFetcher for RatedClient {
    async fn fetch_page(&self, url: &str) -> FetcherResult<FetchOutcome> {
        self.limiter.acquire().await;
        let request_metrics = RequestMetrics::start(url);
        debug!(url, "GET");

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return classify(e, &request_metrics),
        };
        let status = response.status();

        let body = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return classify(e, &request_metrics),
        };
        request_metrics.record_page(status.as_u16());

        // Permissive decode: undecodable byte sequences are replaced, never
        // an error. Bodies of any status are kept verbatim.
        let text = String::from_utf8_lossy(&body).into_owned();
        if text.is_empty() {
            Ok(FetchOutcome::Empty)
        } else {
            Ok(FetchOutcome::Page(text))
        }
    }
}

/// Split a request failure into the two tiers: builder-level errors are
/// programming mistakes and abort the run; everything the transport can
/// throw (timeouts, refused connections, resets mid-body) is transient.
fn classify(err: reqwest::Error, request_metrics: &RequestMetrics) -> FetcherResult<FetchOutcome> {
    if err.is_builder() {
        return Err(FetcherError::InvalidRequest(err.to_string()));
    }
    request_metrics.record_unavailable();
    warn!(error = %err, "transient fetch failure");
    Ok(FetchOutcome::Unavailable)
}
