//! Harvest configuration and tuning constants.

use crate::output::EmptyWritePolicy;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Defendant page endpoint; the defendant ID is appended verbatim.
pub const DEFENDANT_URL_ROOT: &str = "http://www.opcso.org/dcktmstr/dmdspscn.php?d1scnn=";

/// Docket sheet root; links discovered on defendant pages are relative to it.
pub const SHEET_URL_ROOT: &str = "http://www.opcso.org/dcktmstr/";

/// First defendant ID known to exist on the site.
pub const DEFAULT_START_ID: u32 = 633_000;

/// One past the last defendant ID known to exist on the site.
pub const DEFAULT_END_ID: u32 = 791_264;

/// Token bucket refill granularity.
///
/// Replenishment adds `rate * period` tokens on every tick of an independent
/// timer, so refill cadence is decoupled from request cadence and an idle
/// bucket can never bank more than its capacity.
pub const REPLENISH_PERIOD: Duration = Duration::from_millis(100);

/// Bytes of buffered log text that trigger a flush to disk.
pub const LOG_FLUSH_THRESHOLD: usize = 100_000;

/// How the executor decides whether a range was previously attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeCheck {
    /// Check only the two boundary IDs of the range. Cheap, but a shuffled
    /// run interrupted before writing either boundary defeats it.
    Boundary,
    /// Scan the directory for any ID inside the range.
    Scan,
}

impl FromStr for ResumeCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "boundary" => Ok(ResumeCheck::Boundary),
            "scan" => Ok(ResumeCheck::Scan),
            _ => Err(format!(
                "Invalid resume check: {s}. Valid options: boundary, scan"
            )),
        }
    }
}

/// Configuration for one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// First defendant ID to fetch.
    pub start_id: u32,
    /// One past the last defendant ID to fetch.
    pub end_id: u32,
    /// Directory receiving `defendant{id}.html` files.
    pub defendant_dir: PathBuf,
    /// Directory receiving `docket{key}.html` files.
    pub docket_dir: PathBuf,
    /// Run log file, appended across runs.
    pub log_path: PathBuf,
    /// Where to persist the failed-URL list at run end; `None` disables it.
    pub failed_urls_path: Option<PathBuf>,
    /// Token bucket capacity (burst ceiling).
    pub max_tokens: f64,
    /// Token refill rate per second (sustained request rate).
    pub rate: f64,
    /// Echo log entries to the console as they are recorded.
    pub verbose: bool,
    /// Per-request timeout. `None` lets a request wait indefinitely, which
    /// matches the site's slow-but-eventually-answering behavior.
    pub request_timeout: Option<Duration>,
    /// What to do with an item whose fetch produced no content.
    pub empty_write_policy: EmptyWritePolicy,
    /// Resume detection strategy.
    pub resume_check: ResumeCheck,
    /// Defendant endpoint root. Overridable for tests only; the URL shape is
    /// fixed to this one site.
    pub defendant_url_root: String,
    /// Docket sheet endpoint root. Overridable for tests only.
    pub sheet_url_root: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            start_id: DEFAULT_START_ID,
            end_id: DEFAULT_END_ID,
            defendant_dir: PathBuf::from("defendants"),
            docket_dir: PathBuf::from("dockets"),
            log_path: PathBuf::from("log.txt"),
            failed_urls_path: Some(PathBuf::from("failed_urls.json")),
            max_tokens: 10.0,
            rate: 10.0,
            verbose: false,
            request_timeout: None,
            empty_write_policy: EmptyWritePolicy::Touch,
            resume_check: ResumeCheck::Boundary,
            defendant_url_root: DEFENDANT_URL_ROOT.to_string(),
            sheet_url_root: SHEET_URL_ROOT.to_string(),
        }
    }
}

impl HarvestConfig {
    /// Validate the configuration before a run.
    pub fn validate(&self) -> Result<(), String> {
        if self.start_id >= self.end_id {
            return Err(format!(
                "start ID ({}) must be below end ID ({})",
                self.start_id, self.end_id
            ));
        }
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(format!("refill rate must be positive, got {}", self.rate));
        }
        if !self.max_tokens.is_finite() || self.max_tokens < 1.0 {
            return Err(format!(
                "bucket capacity must admit at least one request, got {}",
                self.max_tokens
            ));
        }
        Ok(())
    }

    /// Full URL of one defendant page.
    pub fn defendant_url(&self, id: u32) -> String {
        format!("{}{id}", self.defendant_url_root)
    }

    /// Full URL of one docket sheet, from a link discovered on a defendant
    /// page.
    pub fn sheet_url(&self, link: &str) -> String {
        format!("{}{link}", self.sheet_url_root)
    }
}
