// Copyright jwt-verifier contributors
// SPDX-License-Identifier: Apache-2.0

//! Exponential backoff: a pure delay schedule plus a retry combinator.
//!
//! The schedule is an iterator so it can be inspected in tests without any
//! clock or I/O; the combinator owns the sleeping and the elapsed-time
//! budget. Nothing here knows about HTTP.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::warn;

/// Retry timing parameters for remote key fetches.
///
/// The delay between attempts starts at `initial_interval_ms`, doubles on
/// every attempt, and is capped at `max_interval_ms`. Retrying stops once
/// the total time spent exceeds `max_elapsed_time_ms`, at which point the
/// last failure is surfaced unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub max_elapsed_time_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        BackoffConfig {
            initial_interval_ms: 500,
            max_interval_ms: 60_000,
            max_elapsed_time_ms: 900_000,
        }
    }
}

impl BackoffConfig {
    pub fn new(initial_interval_ms: u64, max_interval_ms: u64, max_elapsed_time_ms: u64) -> Self {
        BackoffConfig {
            initial_interval_ms,
            max_interval_ms,
            max_elapsed_time_ms,
        }
    }

    /// The delay sequence as a pure, unbounded iterator.
    pub fn schedule(&self) -> ExponentialSchedule {
        ExponentialSchedule {
            next: Duration::from_millis(self.initial_interval_ms),
            max: Duration::from_millis(self.max_interval_ms),
        }
    }

    pub fn max_elapsed(&self) -> Duration {
        Duration::from_millis(self.max_elapsed_time_ms)
    }
}

/// Doubling delay sequence, capped at the configured maximum. Never ends;
/// termination is the retry combinator's job.
#[derive(Debug, Clone)]
pub struct ExponentialSchedule {
    next: Duration,
    max: Duration,
}

impl Iterator for ExponentialSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next.min(self.max);
        self.next = (current * 2).min(self.max);
        Some(current)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the elapsed-time budget runs out. The last error is returned unchanged;
/// exhaustion never manufactures a success.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &BackoffConfig,
    operation_name: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let started = Instant::now();
    let mut delays = config.schedule();
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !is_retryable(&e) {
                    return Err(e);
                }

                if started.elapsed() >= config.max_elapsed() {
                    warn!(
                        operation = %operation_name,
                        attempt = attempt,
                        error = %e,
                        "retry budget exhausted"
                    );
                    return Err(e);
                }

                let delay = delays
                    .next()
                    .unwrap_or(Duration::from_millis(config.max_interval_ms));

                warn!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "operation failed, retrying"
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}
