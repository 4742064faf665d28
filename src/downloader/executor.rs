//! Harvest executor.
//!
//! Drives one run through its states: decide the work list (full range or
//! missing-only), fan out concurrent defendant fetches, wait for all of them
//! at a barrier, fan out fetches for every discovered docket sheet, then
//! flush the run log. A fatal error in any task abandons the current
//! fan-out, and the run still exits through the same log-flushing path.

use crate::downloader::config::{HarvestConfig, ResumeCheck, LOG_FLUSH_THRESHOLD};
use crate::downloader::rate_limit::RateLimiter;
use crate::downloader::DownloadError;
use crate::fetcher::{extract_sheet_links, FetchOutcome, PageFetcher, RatedClient};
use crate::metrics::HarvestRunMetrics;
use crate::output::{defendant_page_path, docket_sheet_path, write_page, OutputError};
use crate::resume::{HarvestLock, RangeAuditor};
use crate::runlog::RunLog;
use crate::shutdown::{self, SharedShutdown};
use futures_util::future::try_join_all;
use indicatif::{ProgressBar, ProgressStyle};
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// How the work list for a run was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Every ID in the configured range, shuffled.
    Full,
    /// Only the IDs with no file on disk.
    MissingOnly,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Full => write!(f, "full"),
            RunMode::MissingOnly => write!(f, "missing-only"),
        }
    }
}

/// Summary of one harvest run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Work-list derivation mode.
    pub mode: RunMode,
    /// Defendant IDs in the work list.
    pub defendants_requested: usize,
    /// Defendant pages fetched and written.
    pub defendants_stored: u64,
    /// Distinct docket-sheet links discovered across all defendant pages.
    pub sheets_discovered: usize,
    /// Docket sheets fetched and written.
    pub sheets_stored: u64,
    /// URLs that failed with a transient error. Never retried within the
    /// run; a later run picks the items up through the range audit.
    pub failed_urls: Vec<String>,
}

/// Accumulators shared by every task of a run.
struct RunState {
    links: Mutex<HashSet<String>>,
    failed_urls: Mutex<Vec<String>>,
    run_log: Mutex<RunLog>,
    defendants_stored: AtomicU64,
    sheets_stored: AtomicU64,
}

impl RunState {
    fn new(run_log: RunLog) -> Self {
        Self {
            links: Mutex::new(HashSet::new()),
            failed_urls: Mutex::new(Vec::new()),
            run_log: Mutex::new(run_log),
            defendants_stored: AtomicU64::new(0),
            sheets_stored: AtomicU64::new(0),
        }
    }

    async fn log(&self, message: String) {
        self.run_log.lock().await.record(&message);
    }
}

/// Top-level driver for one harvest run.
pub struct HarvestExecutor {
    config: HarvestConfig,
    fetcher: Arc<dyn PageFetcher>,
    shutdown: Option<SharedShutdown>,
    show_progress: bool,
}

impl HarvestExecutor {
    /// Executor backed by the production rate-limited HTTP client.
    pub fn new(config: HarvestConfig) -> Result<Self, DownloadError> {
        config.validate().map_err(DownloadError::Validation)?;
        let limiter = RateLimiter::start(config.rate, config.max_tokens)?;
        let fetcher: Arc<dyn PageFetcher> =
            Arc::new(RatedClient::new(limiter, config.request_timeout)?);
        Ok(Self {
            config,
            fetcher,
            shutdown: shutdown::global(),
            show_progress: true,
        })
    }

    /// Executor with an injected page fetcher. Used by tests; no rate
    /// limiting or progress display is applied.
    pub fn with_fetcher(
        config: HarvestConfig,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self, DownloadError> {
        config.validate().map_err(DownloadError::Validation)?;
        Ok(Self {
            config,
            fetcher,
            shutdown: shutdown::global(),
            show_progress: false,
        })
    }

    /// Attach a shutdown handle checked at task boundaries.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Toggle the console progress bars.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run the full pipeline.
    ///
    /// Every exit path, completed or cancelled, flushes the run log and
    /// persists the failed-URL list before returning.
    pub async fn run(&self) -> Result<RunReport, DownloadError> {
        for dir in [&self.config.defendant_dir, &self.config.docket_dir] {
            std::fs::create_dir_all(dir)
                .map_err(|e| DownloadError::Output(OutputError::IoError(e.to_string())))?;
        }
        let mut lock = HarvestLock::open(&self.config.defendant_dir)?;
        let _guard = lock.hold()?;

        let state = RunState::new(RunLog::new(
            &self.config.log_path,
            LOG_FLUSH_THRESHOLD,
            self.config.verbose,
        ));
        let run_metrics = HarvestRunMetrics::start();

        let result = self.run_phases(&state).await;

        if let Err(e) = &result {
            state.log(format!("harvest cancelled: {e}")).await;
            run_metrics.record_cancelled(e);
        }
        if let Err(e) = state.run_log.lock().await.flush() {
            warn!(error = %e, "final log flush failed");
        }
        self.persist_failed_urls(&state).await;

        let report = result?;
        run_metrics.record_completed(&report);
        Ok(report)
    }

    async fn run_phases(&self, state: &RunState) -> Result<RunReport, DownloadError> {
        let (mode, defendants) = self.decide_work_list()?;
        state
            .log(format!(
                "harvest started: {} defendants ({mode} mode)",
                defendants.len()
            ))
            .await;
        info!(%mode, defendants = defendants.len(), "starting defendant fan-out");

        let progress = self.make_progress(defendants.len() as u64, "defendants");
        try_join_all(
            defendants
                .iter()
                .map(|&id| self.harvest_defendant(state, &progress, id)),
        )
        .await?;
        progress.finish_and_clear();

        // Barrier: every defendant task has finished, so the link set now
        // holds the complete union for this batch. Draining it also leaves
        // the executor clean for a later run.
        let links: Vec<String> = {
            let mut set = state.links.lock().await;
            set.drain().collect()
        };
        state
            .log(format!(
                "defendant phase complete; {} docket sheets discovered",
                links.len()
            ))
            .await;
        info!(sheets = links.len(), "starting sheet fan-out");

        let progress = self.make_progress(links.len() as u64, "docket sheets");
        try_join_all(
            links
                .iter()
                .map(|link| self.harvest_sheet(state, &progress, link)),
        )
        .await?;
        progress.finish_and_clear();

        state.log("harvest complete".to_string()).await;
        Ok(RunReport {
            mode,
            defendants_requested: defendants.len(),
            defendants_stored: state.defendants_stored.load(Ordering::Relaxed),
            sheets_discovered: links.len(),
            sheets_stored: state.sheets_stored.load(Ordering::Relaxed),
            failed_urls: state.failed_urls.lock().await.clone(),
        })
    }

    /// Pick between a resumed missing-only run and a fresh full-range run.
    fn decide_work_list(&self) -> Result<(RunMode, Vec<u32>), DownloadError> {
        let auditor = RangeAuditor::defendants(&self.config.defendant_dir);
        let attempted = match self.config.resume_check {
            ResumeCheck::Boundary => {
                auditor.range_attempted(self.config.start_id, self.config.end_id)?
            }
            ResumeCheck::Scan => {
                auditor.range_attempted_strict(self.config.start_id, self.config.end_id)?
            }
        };

        if attempted {
            let missing = auditor.missing_ids(self.config.start_id, self.config.end_id)?;
            info!(
                missing = missing.len(),
                "range attempted before, fetching only missing defendants"
            );
            Ok((RunMode::MissingOnly, missing))
        } else {
            let mut ids: Vec<u32> = (self.config.start_id..self.config.end_id).collect();
            // Shuffled order spreads load instead of marching through the
            // site's IDs sequentially.
            ids.shuffle(&mut rand::thread_rng());
            Ok((RunMode::Full, ids))
        }
    }

    /// Fetch one defendant page, persist it, and bank its sheet links.
    async fn harvest_defendant(
        &self,
        state: &RunState,
        progress: &ProgressBar,
        id: u32,
    ) -> Result<(), DownloadError> {
        self.check_shutdown()?;
        let url = self.config.defendant_url(id);
        state.log(format!("downloading defendant {id}")).await;

        match self.fetcher.fetch_page(&url).await? {
            FetchOutcome::Page(body) => {
                let path = defendant_page_path(&self.config.defendant_dir, id);
                state
                    .log(format!("writing {} ({} bytes)", path.display(), body.len()))
                    .await;
                write_page(&path, Some(&body), self.config.empty_write_policy).await?;
                let links = extract_sheet_links(&body)?;
                if !links.is_empty() {
                    state.links.lock().await.extend(links);
                }
                state.defendants_stored.fetch_add(1, Ordering::Relaxed);
            }
            FetchOutcome::Empty => {
                let path = defendant_page_path(&self.config.defendant_dir, id);
                write_page(&path, None, self.config.empty_write_policy).await?;
            }
            FetchOutcome::Unavailable => {
                state.log(format!("fetch failed for {url}")).await;
                state.failed_urls.lock().await.push(url);
            }
        }
        progress.inc(1);
        Ok(())
    }

    /// Fetch one docket sheet and persist it.
    async fn harvest_sheet(
        &self,
        state: &RunState,
        progress: &ProgressBar,
        link: &str,
    ) -> Result<(), DownloadError> {
        self.check_shutdown()?;
        let url = self.config.sheet_url(link);
        state.log(format!("downloading sheet {link}")).await;

        match self.fetcher.fetch_page(&url).await? {
            FetchOutcome::Page(body) => {
                let path = docket_sheet_path(&self.config.docket_dir, link);
                state
                    .log(format!("writing {} ({} bytes)", path.display(), body.len()))
                    .await;
                write_page(&path, Some(&body), self.config.empty_write_policy).await?;
                state.sheets_stored.fetch_add(1, Ordering::Relaxed);
            }
            FetchOutcome::Empty => {
                let path = docket_sheet_path(&self.config.docket_dir, link);
                write_page(&path, None, self.config.empty_write_policy).await?;
            }
            FetchOutcome::Unavailable => {
                state.log(format!("fetch failed for {url}")).await;
                state.failed_urls.lock().await.push(url);
            }
        }
        progress.inc(1);
        Ok(())
    }

    fn check_shutdown(&self) -> Result<(), DownloadError> {
        match &self.shutdown {
            Some(s) if s.is_triggered() => Err(DownloadError::Interrupted),
            _ => Ok(()),
        }
    }

    fn make_progress(&self, len: u64, label: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        let style = ProgressStyle::with_template("{msg} [{wide_bar}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message(label.to_string());
        bar
    }

    async fn persist_failed_urls(&self, state: &RunState) {
        let Some(path) = &self.config.failed_urls_path else {
            return;
        };
        let failed = state.failed_urls.lock().await;
        if failed.is_empty() {
            return;
        }
        match serde_json::to_vec_pretty(&*failed) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(path, bytes) {
                    warn!(error = %e, path = %path.display(), "failed to persist failed-URL list");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize failed-URL list"),
        }
    }
}
