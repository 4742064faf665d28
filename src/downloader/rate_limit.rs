//! Token-bucket admission control for outbound requests.
//!
//! One bucket is shared by every concurrent fetch task in a run. A caller
//! takes a token per request, or parks until the background replenisher adds
//! more. Bursts drain the bucket down from its capacity; sustained load is
//! paced at the configured refill rate.

use crate::downloader::config::REPLENISH_PERIOD;
use crate::metrics;
use std::sync::{Arc, Weak};
use std::time::Instant;
use tokio::sync::{Mutex, Notify};
use tokio::time::{interval, MissedTickBehavior};

/// Rate limiter configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Refill rate must be a positive, finite number of tokens per second
    #[error("invalid refill rate: {0}")]
    InvalidRate(f64),

    /// Bucket capacity must admit at least one request
    #[error("invalid bucket capacity: {0}")]
    InvalidCapacity(f64),
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
}

/// Shared token bucket gating outbound HTTP requests.
///
/// The token check-and-decrement is a single critical section; the wrapped
/// request itself runs with no lock held. Callers that find the bucket empty
/// suspend on a notifier until replenishment wakes them. No fairness is
/// guaranteed between parked callers.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    notify: Notify,
    rate: f64,
    max_tokens: f64,
}

impl RateLimiter {
    /// Validate the parameters, start the bucket full, and spawn the
    /// replenishment task.
    ///
    /// The task holds only a [`Weak`] reference and exits once the last
    /// limiter handle is dropped.
    pub fn start(rate: f64, max_tokens: f64) -> Result<Arc<Self>, RateLimitError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(RateLimitError::InvalidRate(rate));
        }
        if !max_tokens.is_finite() || max_tokens < 1.0 {
            return Err(RateLimitError::InvalidCapacity(max_tokens));
        }

        let limiter = Arc::new(Self {
            bucket: Mutex::new(Bucket { tokens: max_tokens }),
            notify: Notify::new(),
            rate,
            max_tokens,
        });
        tokio::spawn(replenish_loop(Arc::downgrade(&limiter)));
        Ok(limiter)
    }

    /// Wait until a token is available, then consume it.
    pub async fn acquire(&self) {
        let started = Instant::now();
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register as a waiter before checking the bucket so a refill
            // landing in between cannot be missed.
            notified.as_mut().enable();
            {
                let mut bucket = self.bucket.lock().await;
                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    metrics::record_rate_limit_wait(started.elapsed());
                    return;
                }
            }
            notified.await;
        }
    }

    /// Tokens currently in the bucket.
    pub async fn available(&self) -> f64 {
        self.bucket.lock().await.tokens
    }

    /// Configured refill rate in tokens per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Configured bucket capacity.
    pub fn capacity(&self) -> f64 {
        self.max_tokens
    }

    async fn replenish(&self, amount: f64) {
        let mut bucket = self.bucket.lock().await;
        bucket.tokens = (bucket.tokens + amount).min(self.max_tokens);
        if bucket.tokens >= 1.0 {
            self.notify.notify_waiters();
        }
    }
}

async fn replenish_loop(limiter: Weak<RateLimiter>) {
    let mut ticker = interval(REPLENISH_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; skip it so startup does not add a
    // tick's worth of tokens to an already-full bucket.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let Some(limiter) = limiter.upgrade() else {
            break;
        };
        let amount = limiter.rate * REPLENISH_PERIOD.as_secs_f64();
        limiter.replenish(amount).await;
    }
}
