//! Download orchestration and rate limiting.
//!
//! This module drives the complete harvest workflow:
//!
//! 1. **Configuration**: describe the run with [`config::HarvestConfig`]
//! 2. **Mode decision**: resume from what is on disk, or shuffle the full
//!    ID range
//! 3. **Rate limiting**: every request passes through
//!    [`rate_limit::RateLimiter`]
//! 4. **Fan-out/fan-in**: concurrent defendant fetches, a strict barrier,
//!    then concurrent sheet fetches, all in [`executor::HarvestExecutor`]
//!
//! # Error Handling
//!
//! Operations return `Result<T, DownloadError>`. Transient network failures
//! never surface here; they are absorbed per item and reported through the
//! failed-URL list. Everything that does surface is fatal and cancels the
//! run after a final log flush.
//!
//! # Related Modules
//!
//! - [`crate::fetcher`] - page fetching and link extraction
//! - [`crate::output`] - page persistence
//! - [`crate::resume`] - on-disk range auditing

pub mod config;
pub mod executor;
pub mod rate_limit;

pub use config::{HarvestConfig, ResumeCheck};
pub use executor::{HarvestExecutor, RunMode, RunReport};
pub use rate_limit::{RateLimitError, RateLimiter};

/// Download errors: the fatal tier that cancels a run.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Rate limiter configuration rejected
    #[error("rate limit error: {0}")]
    RateLimit(#[from] RateLimitError),

    /// Unexpected fetch-tier failure
    #[error("fetch error: {0}")]
    Fetcher(#[from] crate::fetcher::FetcherError),

    /// Persistence failure
    #[error("output error: {0}")]
    Output(#[from] crate::output::OutputError),

    /// Range audit or run lock failure
    #[error("resume error: {0}")]
    Resume(#[from] crate::resume::ResumeError),

    /// Invalid run configuration
    #[error("validation error: {0}")]
    Validation(String),

    /// Run interrupted by a shutdown request
    #[error("harvest interrupted by shutdown request")]
    Interrupted,
}
