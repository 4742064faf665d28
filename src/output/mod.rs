//! Page persistence.
//!
//! Each fetched item lands as one file whose name is derived from the item's
//! identifier, so re-running with the same inputs always targets the same
//! paths and overwrites rather than accumulates.

pub mod page;
pub mod path;

pub use page::{write_page, EmptyWritePolicy};
pub use path::{defendant_page_path, docket_sheet_path, sheet_key};

/// Output errors: a failed write is fatal and cancels the run.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Filesystem failure while creating or writing a file
    #[error("IO error: {0}")]
    IoError(String),
}
