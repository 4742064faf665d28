//! Resume capability.
//!
//! Nothing about a run is persisted beyond the output files themselves: a
//! correctly named file is the durable marker that its item was attempted.
//! The [`audit::RangeAuditor`] turns a directory listing back into a work
//! list, and [`lock::HarvestLock`] keeps two runs from chewing on the same
//! output tree at once.

pub mod audit;
pub mod lock;

pub use audit::RangeAuditor;
pub use lock::HarvestLock;

/// Resume errors.
#[derive(Debug, thiserror::Error)]
pub enum ResumeError {
    /// Filesystem failure while scanning an output directory
    #[error("IO error: {0}")]
    IoError(String),

    /// Run lock could not be opened or acquired
    #[error("lock error: {0}")]
    LockError(String),
}
