//! Observability metrics for harvest runs.
//!
//! Uses the `metrics` facade for low-overhead collection; recording is a
//! no-op until an exporter is installed, so library users pay nothing unless
//! they opt in. The CLI can expose a Prometheus scrape endpoint via
//! [`init_metrics`].

use crate::downloader::{DownloadError, RunReport};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Install the Prometheus exporter and register metric descriptions.
///
/// Idempotent; call once at startup when a scrape endpoint is wanted.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        debug!("metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "pages_fetched_total",
        Unit::Count,
        "HTTP responses received, labeled by status"
    );
    describe_counter!(
        "pages_failed_total",
        Unit::Count,
        "Transient fetch failures (timeout or transport error)"
    );
    describe_histogram!(
        "fetch_duration_seconds",
        Unit::Seconds,
        "Wall time of one GET, token wait excluded"
    );
    describe_histogram!(
        "rate_limit_wait_seconds",
        Unit::Seconds,
        "Time spent waiting for a bucket token"
    );
    describe_counter!(
        "harvest_runs_completed_total",
        Unit::Count,
        "Runs that reached the final barrier"
    );
    describe_counter!(
        "harvest_runs_cancelled_total",
        Unit::Count,
        "Runs aborted by a fatal error or shutdown request"
    );

    info!(%addr, "metrics exporter listening");
    Ok(())
}

/// Record the time one caller spent parked on the token bucket.
pub fn record_rate_limit_wait(wait: Duration) {
    histogram!("rate_limit_wait_seconds").record(wait.as_secs_f64());
}

/// Per-request timing and outcome recording.
pub struct RequestMetrics {
    start: Instant,
}

impl RequestMetrics {
    /// Start timing a request.
    pub fn start(url: &str) -> Self {
        debug!(url, "request started");
        Self {
            start: Instant::now(),
        }
    }

    /// A response arrived, whatever its status.
    pub fn record_page(&self, status: u16) {
        counter!("pages_fetched_total", "status" => status.to_string()).increment(1);
        histogram!("fetch_duration_seconds").record(self.start.elapsed().as_secs_f64());
    }

    /// The request died on a transient transport failure.
    pub fn record_unavailable(&self) {
        counter!("pages_failed_total").increment(1);
        histogram!("fetch_duration_seconds").record(self.start.elapsed().as_secs_f64());
    }
}

/// Whole-run outcome metrics.
pub struct HarvestRunMetrics {
    start: Instant,
}

impl HarvestRunMetrics {
    /// Begin tracking a run.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// The run reached the final barrier.
    pub fn record_completed(&self, report: &RunReport) {
        counter!("harvest_runs_completed_total").increment(1);
        info!(
            defendants_stored = report.defendants_stored,
            sheets_stored = report.sheets_stored,
            failed = report.failed_urls.len(),
            duration_secs = self.start.elapsed().as_secs(),
            "harvest run completed"
        );
    }

    /// The run was cancelled by a fatal error or shutdown.
    pub fn record_cancelled(&self, cause: &DownloadError) {
        counter!("harvest_runs_cancelled_total").increment(1);
        error!(
            error = %cause,
            duration_secs = self.start.elapsed().as_secs(),
            "harvest run cancelled"
        );
    }
}
