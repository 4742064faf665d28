//! Main entry point for the docket-downloader CLI

use clap::Parser;
use docket_downloader::cli::{Cli, Commands};
use docket_downloader::shutdown::{self, Shutdown};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    // Check if JSON output is requested via environment variable
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("docket_downloader=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    // Install the shared shutdown signal and the Ctrl+C handler
    let shutdown_handle = Shutdown::shared();
    shutdown::register_global(shutdown_handle.clone());
    tokio::spawn({
        let shutdown_handle = shutdown_handle.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - finishing in-flight work and flushing the log");
                shutdown_handle.trigger();
            }
        }
    });

    let result = match &cli.command {
        Commands::Harvest(args) => args
            .execute(&cli, shutdown_handle)
            .await
            .map_err(|e| anyhow::anyhow!(e)),
        Commands::Audit(args) => args.execute(&cli).map_err(|e| anyhow::anyhow!(e)),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }
}
