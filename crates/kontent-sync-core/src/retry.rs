//! Retry policy for transient Sync API failures
//!
//! Wraps one logical HTTP call with:
//! - a per-attempt timeout (an expired attempt counts as a timeout failure)
//! - retries on transient status codes (408, 429, 500, 502, 503, 504) and
//!   on timed-out attempts
//! - exponential backoff with jitter between attempts
//! - cooperative cancellation of both the in-flight attempt and the backoff
//!
//! Once retries are exhausted the last outcome is returned as-is; the
//! policy never turns a failed response into an `Err`.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::ports::transport::{RawResponse, TransportError};

/// Status codes that are retried
pub const RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Outcome of a single HTTP attempt
pub type AttemptOutcome = Result<RawResponse, TransportError>;

/// The caller cancelled the operation
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Operation was cancelled")]
pub struct Cancelled;

/// Retry strategy injected into a `SyncClient`
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    enabled: bool,
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
    attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Creates a policy from configuration
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: config.jitter,
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
        }
    }

    /// Creates a policy with default settings (3 retries, 1s base delay, 30s timeout)
    pub fn with_defaults() -> Self {
        Self::new(&RetryConfig::default())
    }

    /// A policy that surfaces failures after the first attempt
    ///
    /// The per-attempt timeout still applies.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::with_defaults()
        }
    }

    /// Whether retries are enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Maximum number of retries after the initial attempt
    pub fn max_retries(&self) -> u32 {
        if self.enabled {
            self.max_retries
        } else {
            0
        }
    }

    /// Ceiling for a single attempt
    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Whether an attempt outcome should be retried
    pub fn is_retryable(outcome: &AttemptOutcome) -> bool {
        match outcome {
            Ok(response) => RETRYABLE_STATUS_CODES.contains(&response.status),
            Err(e) => e.is_timeout(),
        }
    }

    /// Delay before retry number `retry` (0-based)
    ///
    /// `base_delay * 2^retry`, jittered by +/-25% when enabled, capped at
    /// `max_delay`.
    pub fn calculate_backoff(&self, retry: u32) -> Duration {
        let exponential = self.base_delay.as_secs_f64() * 2f64.powi(retry.min(31) as i32);

        let delay = if self.jitter {
            let factor = rand::thread_rng().gen_range(0.75..=1.25);
            exponential * factor
        } else {
            exponential
        };

        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }

    /// Runs `attempt` until it produces a non-retryable outcome or retries
    /// run out
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` fires before an outcome is accepted;
    /// the in-flight attempt is dropped and no further attempts are made.
    pub async fn execute<F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> Result<AttemptOutcome, Cancelled>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AttemptOutcome>,
    {
        let max_retries = self.max_retries();
        let mut retry = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Cancelled),
                result = tokio::time::timeout(self.attempt_timeout, attempt()) => match result {
                    Ok(outcome) => outcome,
                    Err(_) => Err(TransportError::Timeout(format!(
                        "attempt exceeded {}s",
                        self.attempt_timeout.as_secs_f64()
                    ))),
                },
            };

            if !Self::is_retryable(&outcome) {
                if retry > 0 {
                    debug!(attempts = retry + 1, "Request settled after retry");
                }
                return Ok(outcome);
            }

            if retry >= max_retries {
                if self.enabled {
                    warn!(
                        attempts = retry + 1,
                        max_retries, "Retry limit exhausted, surfacing last outcome"
                    );
                }
                return Ok(outcome);
            }

            let backoff = self.calculate_backoff(retry);
            warn!(
                attempt = retry + 1,
                max_retries,
                status = outcome.as_ref().map(|r| r.status).unwrap_or(0),
                backoff_ms = backoff.as_millis() as u64,
                "Transient failure, backing off"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Cancelled),
                _ = tokio::time::sleep(backoff) => {}
            }
            retry += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}
