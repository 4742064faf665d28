//! `harvest` and `audit` command implementations.

use crate::downloader::config::{DEFAULT_END_ID, DEFAULT_START_ID};
use crate::downloader::{HarvestConfig, HarvestExecutor, ResumeCheck, RunReport};
use crate::output::EmptyWritePolicy;
use crate::resume::RangeAuditor;
use crate::shutdown::SharedShutdown;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use super::CliError;

/// Docket Downloader CLI.
#[derive(Parser, Debug)]
#[command(name = "docket-downloader")]
#[command(about = "Download defendant pages and docket sheets from the public records site", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,

    /// Directory receiving defendant pages
    #[arg(long, global = true, default_value = "defendants")]
    pub defendant_dir: PathBuf,

    /// Directory receiving docket sheets
    #[arg(long, global = true, default_value = "dockets")]
    pub docket_dir: PathBuf,
}

/// CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch defendant pages and the docket sheets they link to
    Harvest(HarvestArgs),

    /// Report which IDs in a range are missing from disk
    Audit(AuditArgs),
}

/// Arguments for the harvest command.
#[derive(Parser, Debug)]
pub struct HarvestArgs {
    /// First defendant ID to fetch
    #[arg(long, default_value_t = DEFAULT_START_ID)]
    pub start_id: u32,

    /// One past the last defendant ID to fetch
    #[arg(long, default_value_t = DEFAULT_END_ID)]
    pub end_id: u32,

    /// Run log file
    #[arg(long, default_value = "log.txt")]
    pub log_file: PathBuf,

    /// Where to write the failed-URL report at run end
    #[arg(long, default_value = "failed_urls.json")]
    pub failed_urls_file: PathBuf,

    /// Token bucket capacity (burst ceiling)
    #[arg(long, default_value_t = 10.0)]
    pub max_tokens: f64,

    /// Token refill rate per second (sustained request rate)
    #[arg(long, default_value_t = 10.0)]
    pub rate: f64,

    /// Echo log entries to the console as they are recorded
    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    /// Per-request timeout in seconds (omit to wait indefinitely)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// What to do when a fetch returns no content: touch or skip
    #[arg(long, default_value = "touch")]
    pub empty_write: EmptyWritePolicy,

    /// Resume detection: boundary (cheap heuristic) or scan (full directory
    /// scan)
    #[arg(long, default_value = "boundary")]
    pub resume_check: ResumeCheck,

    /// Expose Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

impl HarvestArgs {
    /// Build the run configuration and drive a full harvest.
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        if let Some(addr) = self.metrics_addr {
            crate::metrics::init_metrics(addr)
                .map_err(|e| CliError::InvalidArgument(format!("metrics exporter: {e}")))?;
        }

        let config = self.to_config(cli);
        info!(
            start_id = config.start_id,
            end_id = config.end_id,
            rate = config.rate,
            max_tokens = config.max_tokens,
            "starting harvest"
        );

        let executor = HarvestExecutor::new(config)?.with_shutdown(shutdown);
        let report = executor.run().await?;

        match cli.output_format {
            OutputFormat::Json => output_json(&report),
            OutputFormat::Human => output_human(&report),
        }
        Ok(())
    }

    fn to_config(&self, cli: &Cli) -> HarvestConfig {
        HarvestConfig {
            start_id: self.start_id,
            end_id: self.end_id,
            defendant_dir: cli.defendant_dir.clone(),
            docket_dir: cli.docket_dir.clone(),
            log_path: self.log_file.clone(),
            failed_urls_path: Some(self.failed_urls_file.clone()),
            max_tokens: self.max_tokens,
            rate: self.rate,
            verbose: self.verbose,
            request_timeout: self.timeout_secs.map(Duration::from_secs),
            empty_write_policy: self.empty_write,
            resume_check: self.resume_check,
            ..HarvestConfig::default()
        }
    }
}

/// Arguments for the audit command.
#[derive(Parser, Debug)]
pub struct AuditArgs {
    /// First ID of the audited range
    #[arg(long)]
    pub start_id: u32,

    /// One past the last ID of the audited range
    #[arg(long)]
    pub end_id: u32,

    /// Which directory to audit: defendants or dockets
    #[arg(long, default_value = "defendants")]
    pub target: AuditTarget,

    /// Print every missing ID instead of just the count
    #[arg(long, default_value_t = false)]
    pub list: bool,
}

/// Directory selector for the audit command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTarget {
    /// Audit the defendant page directory
    Defendants,
    /// Audit the docket sheet directory
    Dockets,
}

impl FromStr for AuditTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "defendants" => Ok(AuditTarget::Defendants),
            "dockets" => Ok(AuditTarget::Dockets),
            _ => Err(format!(
                "Invalid audit target: {s}. Valid options: defendants, dockets"
            )),
        }
    }
}

impl AuditArgs {
    /// Scan the target directory and report absent IDs.
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        if self.start_id >= self.end_id {
            return Err(CliError::InvalidArgument(format!(
                "start ID ({}) must be below end ID ({})",
                self.start_id, self.end_id
            )));
        }

        let auditor = match self.target {
            AuditTarget::Defendants => RangeAuditor::defendants(&cli.defendant_dir),
            AuditTarget::Dockets => RangeAuditor::dockets(&cli.docket_dir),
        };
        let missing = auditor.missing_ids(self.start_id, self.end_id)?;

        match cli.output_format {
            OutputFormat::Json => {
                let mut output = serde_json::json!({
                    "start_id": self.start_id,
                    "end_id": self.end_id,
                    "missing_count": missing.len(),
                });
                if self.list {
                    output["missing"] = serde_json::json!(missing);
                }
                println!("{output}");
            }
            OutputFormat::Human => {
                println!(
                    "{} of {} IDs missing from {}",
                    missing.len(),
                    self.end_id - self.start_id,
                    auditor.dir().display()
                );
                if self.list {
                    for id in &missing {
                        println!("{id}");
                    }
                }
            }
        }
        Ok(())
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

fn output_json(report: &RunReport) {
    match serde_json::to_string(report) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to serialize report: {e}"),
    }
}

fn output_human(report: &RunReport) {
    println!("\nHarvest completed ({} mode)", report.mode);
    println!("Defendants requested: {}", report.defendants_requested);
    println!("Defendant pages stored: {}", report.defendants_stored);
    println!("Docket sheets discovered: {}", report.sheets_discovered);
    println!("Docket sheets stored: {}", report.sheets_stored);
    if !report.failed_urls.is_empty() {
        println!("Failed URLs: {}", report.failed_urls.len());
    }
}
