//! CLI command implementations

pub mod error;
pub mod harvest;

pub use error::CliError;
pub use harvest::{AuditArgs, Cli, Commands, HarvestArgs, OutputFormat};
