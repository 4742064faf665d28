//! Page fetching.
//!
//! Defines the fetch seam ([`PageFetcher`]), the two-tier outcome model, and
//! the production implementations: a rate-limited HTTP client and the
//! docket-link extractor.
//!
//! The outcome model makes the recoverable/fatal boundary explicit. A
//! timeout or transport failure becomes [`FetchOutcome::Unavailable`] — the
//! run records the URL and keeps going, because transient flakiness must not
//! kill a run of tens of thousands of items. Anything else is a programming
//! error surfaced as [`FetcherError`], which aborts the enclosing fan-out.

pub mod http;
pub mod links;

pub use http::RatedClient;
pub use links::extract_sheet_links;

use async_trait::async_trait;

/// Fetcher errors: the fatal tier.
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// The request could not even be issued (malformed URL or client
    /// misconfiguration)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A link selector failed to parse
    #[error("malformed link selector: {0}")]
    Selector(String),
}

/// Result type for fetch operations.
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Outcome of fetching one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response body, decoded permissively.
    Page(String),
    /// The server answered with an empty body.
    Empty,
    /// Timeout or transport-level failure; the run continues without this
    /// item.
    Unavailable,
}

/// Seam between the orchestrator and the network.
///
/// The production implementation is [`RatedClient`]; tests inject scripted
/// stand-ins.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page by URL.
    ///
    /// Transient transport failures map to [`FetchOutcome::Unavailable`];
    /// an `Err` is fatal and cancels the caller's fan-out.
    async fn fetch_page(&self, url: &str) -> FetcherResult<FetchOutcome>;
}
