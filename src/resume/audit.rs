//! Range auditing: what is already on disk.

use super::ResumeError;
use crate::output::path::{page_id, DEFENDANT_PREFIX, DOCKET_PREFIX};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// Scans a page directory for `{prefix}{id}.html` files so a run can decide
/// what it still has to fetch.
#[derive(Debug, Clone)]
pub struct RangeAuditor {
    dir: PathBuf,
    prefix: &'static str,
}

impl RangeAuditor {
    /// Auditor over a defendant page directory.
    pub fn defendants(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: DEFENDANT_PREFIX,
        }
    }

    /// Auditor over a docket sheet directory.
    pub fn dockets(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: DOCKET_PREFIX,
        }
    }

    /// Directory being audited.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every ID with a matching file present.
    ///
    /// Filenames that do not match the pattern are skipped, never an error.
    /// A directory that does not exist yet reads as empty.
    pub fn downloaded_ids(&self) -> Result<HashSet<u32>, ResumeError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(ResumeError::IoError(e.to_string())),
        };

        let mut ids = HashSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| ResumeError::IoError(e.to_string()))?;
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| page_id(name, self.prefix))
            {
                ids.insert(id);
            }
        }
        Ok(ids)
    }

    /// Sorted list of the IDs in `[start, stop)` with no file on disk.
    pub fn missing_ids(&self, start: u32, stop: u32) -> Result<Vec<u32>, ResumeError> {
        let downloaded = self.downloaded_ids()?;
        Ok((start..stop).filter(|id| !downloaded.contains(id)).collect())
    }

    /// Boundary heuristic: is either end of the range already on disk?
    ///
    /// A deliberately cheap proxy for "this range was attempted before".
    /// It can misfire — a shuffled run interrupted before writing either
    /// boundary looks unattempted — so [`Self::range_attempted_strict`] is
    /// available where the full scan is worth paying for.
    pub fn range_attempted(&self, start: u32, stop: u32) -> Result<bool, ResumeError> {
        let downloaded = self.downloaded_ids()?;
        Ok(downloaded.contains(&start) || downloaded.contains(&stop))
    }

    /// Strict variant: is any ID inside `[start, stop)` on disk?
    pub fn range_attempted_strict(&self, start: u32, stop: u32) -> Result<bool, ResumeError> {
        let downloaded = self.downloaded_ids()?;
        Ok((start..stop).any(|id| downloaded.contains(&id)))
    }
}
