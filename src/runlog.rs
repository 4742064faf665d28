//! Buffered run log.
//!
//! Every fetch and write of a run is recorded as a timestamped entry in an
//! in-memory buffer that is appended to a single log file once it crosses a
//! size threshold. A final flush at the end of a run, including a cancelled
//! one, writes whatever is left. Entries can optionally be echoed to the
//! console for interactive runs.

use chrono::Local;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Size-threshold buffered log sink appending to one file.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    buffer: String,
    threshold: usize,
    echo: bool,
}

impl RunLog {
    /// Log sink writing to `path`, flushing once the buffer holds at least
    /// `threshold` bytes. With `echo` set, entries are also printed as they
    /// are recorded.
    pub fn new(path: impl Into<PathBuf>, threshold: usize, echo: bool) -> Self {
        Self {
            path: path.into(),
            buffer: String::new(),
            threshold,
            echo,
        }
    }

    /// Append one timestamped entry, flushing opportunistically when the
    /// buffer crosses the threshold. A failed opportunistic flush keeps the
    /// buffer intact and is retried on the next crossing.
    pub fn record(&mut self, message: &str) {
        let stamp = Local::now().format("%c");
        if self.echo {
            println!("{stamp}");
            println!("{message}");
        }
        let _ = writeln!(self.buffer, "{stamp}\n{message}");
        if self.buffer.len() >= self.threshold {
            if let Err(e) = self.flush() {
                warn!(error = %e, path = %self.path.display(), "run log flush failed");
            }
        }
    }

    /// Append the buffered entries to the log file and clear the buffer.
    pub fn flush(&mut self) -> std::io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(self.buffer.as_bytes())?;
        self.buffer.clear();
        Ok(())
    }

    /// Bytes currently held in the buffer.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Path of the underlying log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
