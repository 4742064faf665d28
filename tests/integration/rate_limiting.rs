//! Integration tests for token-bucket rate limiting
//!
//! Timing assertions run under tokio's paused clock, so they are
//! deterministic: the runtime auto-advances time only when every task is
//! parked on a timer.

use docket_downloader::downloader::{RateLimitError, RateLimiter};
use std::time::Duration;

#[tokio::test]
async fn invalid_parameters_are_rejected() {
    assert!(matches!(
        RateLimiter::start(0.0, 10.0),
        Err(RateLimitError::InvalidRate(_))
    ));
    assert!(matches!(
        RateLimiter::start(10.0, 0.0),
        Err(RateLimitError::InvalidCapacity(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn burst_up_to_capacity_is_immediate() {
    let limiter = RateLimiter::start(10.0, 5.0).unwrap();

    let started = tokio::time::Instant::now();
    for _ in 0..5 {
        limiter.acquire().await;
    }
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn drained_bucket_suspends_until_replenished() {
    let limiter = RateLimiter::start(10.0, 5.0).unwrap();
    for _ in 0..5 {
        limiter.acquire().await;
    }

    // The bucket is empty; the next caller must park until the replenisher
    // adds a token on its fixed schedule.
    let started = tokio::time::Instant::now();
    limiter.acquire().await;
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn sustained_demand_is_bounded_by_rate() {
    // Burst of 5, then 10 more tokens need a full second of refill: the
    // admission count over any window is bounded by capacity + rate * T.
    let limiter = RateLimiter::start(10.0, 5.0).unwrap();

    let started = tokio::time::Instant::now();
    for _ in 0..15 {
        limiter.acquire().await;
    }
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() <= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn idle_bucket_never_exceeds_capacity() {
    let limiter = RateLimiter::start(100.0, 5.0).unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(limiter.available().await, 5.0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_are_all_admitted() {
    let limiter = RateLimiter::start(10.0, 2.0).unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await })
        })
        .collect();

    let started = tokio::time::Instant::now();
    for task in tasks {
        task.await.unwrap();
    }
    // 8 admissions from a 2-token bucket at 10 tokens/s: the last 6 must
    // have waited for refills.
    assert!(started.elapsed() >= Duration::from_millis(600));
}
