//! Rate-limit retry for remote writes.
//!
//! Only 429 is retried: wait the server's Retry-After hint (or the fixed
//! backoff) plus a little jitter, then resend. Every other failure is
//! returned immediately.

use crate::config::RetryConfig;
use crate::remote::ApiResponse;
use crate::{Error, Result};
use rand::Rng;
use serde_json::Value;
use std::time::Duration;

/// Retry policy for a single write
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_secs(config.backoff_secs),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
        }
    }

    /// A policy that retries without waiting (tests, dry runs)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// How long to wait before the next attempt
    pub fn delay_for(&self, retry_after: Option<Duration>) -> Duration {
        let base = retry_after.unwrap_or(self.backoff);
        base + self.jitter()
    }

    fn jitter(&self) -> Duration {
        if self.max_jitter.is_zero() {
            return Duration::ZERO;
        }
        let max = self.max_jitter.as_secs_f64();
        Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..=max))
    }

    /// Send a request until it stops being rate limited
    ///
    /// `send` is called once per attempt. Transport errors and non-429
    /// failures are returned as-is; running out of attempts yields
    /// [`Error::RateLimitExhausted`].
    pub fn run<F>(&self, mut send: F) -> Result<Value>
    where
        F: FnMut() -> Result<ApiResponse>,
    {
        for attempt in 1..=self.max_attempts {
            match send()? {
                ApiResponse::Success(value) => return Ok(value),
                ApiResponse::Failure { status, body } => {
                    return Err(Error::Remote { status, body });
                }
                ApiResponse::RateLimited { retry_after } => {
                    if attempt == self.max_attempts {
                        break;
                    }
                    let wait = self.delay_for(retry_after);
                    tracing::warn!(
                        "429 rate-limited. Waiting {:.2}s then retrying (attempt {}/{})",
                        wait.as_secs_f64(),
                        attempt,
                        self.max_attempts
                    );
                    std::thread::sleep(wait);
                }
            }
        }

        Err(Error::RateLimitExhausted {
            attempts: self.max_attempts,
        })
    }
}
