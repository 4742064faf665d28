//! # Docket Downloader Library
//!
//! Concurrent downloader for one public records site. Two linked classes of
//! resources are fetched: defendant pages (HTML, keyed by a numeric ID) and
//! the docket sheets they link to (preformatted text, keyed by a link token
//! parsed out of a defendant page). Every fetch passes through a shared
//! token bucket, each item lands as one deterministically named file, and an
//! interrupted run resumes by fetching only what is missing on disk.
//!
//! ## Features
//!
//! - **Adaptive rate limiting**: token-bucket admission control with a
//!   configurable sustained rate and burst ceiling
//! - **Fan-out/fan-in**: unbounded concurrent fetches with a strict barrier
//!   between the defendant phase and the sheet phase
//! - **Resume capability**: the work list is re-derived from on-disk
//!   filenames, so completed items are never fetched twice
//! - **Partial-failure tracking**: transient network failures are logged and
//!   reported without aborting the run; unexpected errors cancel it loudly
//!
//! ## Quick Start
//!
//! ```no_run
//! use docket_downloader::downloader::{HarvestConfig, HarvestExecutor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarvestConfig {
//!     start_id: 633_000,
//!     end_id: 633_100,
//!     ..HarvestConfig::default()
//! };
//!
//! let report = HarvestExecutor::new(config)?.run().await?;
//! println!("stored {} defendant pages", report.defendants_stored);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several core modules:
//!
//! - [`downloader`] - run orchestration, token-bucket rate limiting, and
//!   run configuration
//! - [`fetcher`] - rate-limited HTTP client and docket-link extraction
//! - [`output`] - deterministic file naming and page persistence
//! - [`resume`] - on-disk range auditing and the per-run lock
//! - [`runlog`] - buffered run log with threshold-triggered flushing
//! - [`metrics`] - counters and histograms for observability
//! - [`shutdown`] - cooperative Ctrl+C handling shared across tasks

#![warn(missing_docs)]
#![warn(clippy::all)]

/// CLI command implementations
pub mod cli;

/// Download orchestration
pub mod downloader;

/// Page fetching and link extraction
pub mod fetcher;

/// Observability metrics
pub mod metrics;

/// Page persistence
pub mod output;

/// Resume capability for interrupted runs
pub mod resume;

/// Buffered run logging
pub mod runlog;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

// Re-export the types most callers need.
pub use downloader::{HarvestConfig, HarvestExecutor, RunMode, RunReport};
pub use fetcher::{FetchOutcome, PageFetcher};
