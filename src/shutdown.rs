//! Cooperative shutdown signalling.
//!
//! A [`Shutdown`] handle is shared across the CLI, the executor, and any
//! long-lived tasks so a Ctrl+C can stop a run at the next suspension point
//! instead of tearing the process down mid-write.

use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared handle to a [`Shutdown`] signal.
pub type SharedShutdown = Arc<Shutdown>;

static GLOBAL: OnceCell<SharedShutdown> = OnceCell::new();

/// Register the process-wide shutdown handle. The first registration wins.
pub fn register_global(handle: SharedShutdown) {
    let _ = GLOBAL.set(handle);
}

/// The process-wide shutdown handle, if one was registered.
pub fn global() -> Option<SharedShutdown> {
    GLOBAL.get().cloned()
}

/// One-way shutdown flag with async waiters.
///
/// The flag only ever transitions from untripped to tripped; waiters are
/// woken exactly once.
#[derive(Debug, Default)]
pub struct Shutdown {
    triggered: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    /// Fresh, untriggered signal behind an [`Arc`].
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::default())
    }

    /// Trip the flag and wake every waiter. Subsequent calls are no-ops.
    pub fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Suspend until the flag trips. Returns immediately if already tripped.
    pub async fn wait(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before the flag check so a trigger landing in between
        // cannot be missed.
        notified.as_mut().enable();
        if self.is_triggered() {
            return;
        }
        notified.await;
    }
}
