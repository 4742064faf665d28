//! Page persister.
//!
//! One write per item: the file handle is scoped to the call and closed on
//! every exit path, including a failed write. Writes truncate, so re-runs
//! replace rather than append.

use super::OutputError;
use std::path::Path;
use std::str::FromStr;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// What to do when a fetch produced no content for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyWritePolicy {
    /// Create (or truncate) the file anyway, marking the item attempted so
    /// a resumed run does not refetch it. The default.
    Touch,
    /// Leave the filesystem untouched; a later run retries the item.
    Skip,
}

impl FromStr for EmptyWritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "touch" => Ok(EmptyWritePolicy::Touch),
            "skip" => Ok(EmptyWritePolicy::Skip),
            _ => Err(format!(
                "Invalid empty-write policy: {s}. Valid options: touch, skip"
            )),
        }
    }
}

/// Write fetched content to its destination path, truncating any previous
/// copy. With no body, `policy` decides between touching the file and doing
/// nothing.
pub async fn write_page(
    path: &Path,
    body: Option<&str>,
    policy: EmptyWritePolicy,
) -> Result<(), OutputError> {
    if body.is_none() && policy == EmptyWritePolicy::Skip {
        debug!(path = %path.display(), "empty fetch, skipping write");
        return Ok(());
    }

    let mut file = File::create(path)
        .await
        .map_err(|e| OutputError::IoError(e.to_string()))?;
    if let Some(text) = body {
        file.write_all(text.as_bytes())
            .await
            .map_err(|e| OutputError::IoError(e.to_string()))?;
    }
    file.flush()
        .await
        .map_err(|e| OutputError::IoError(e.to_string()))?;
    Ok(())
}
