//! Exponential backoff retry for collection item import.

use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RetrySettings;
use crate::error::{CliError, CliResult};

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_retries: u32,
    pub initial_interval: Duration,
    /// Maximum delay cap.
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_interval: Duration::from_millis(settings.initial_interval_ms),
            max_interval: Duration::from_millis(settings.max_interval_ms),
            multiplier: settings.multiplier,
        }
    }
}

/// Network failures, throttling and 5xx answers are worth another try.
pub fn is_transient(error: &CliError) -> bool {
    match error {
        CliError::Network(_) | CliError::ConnectionFailed(_) | CliError::Server(_) => true,
        CliError::Api { status, .. } => *status >= 500 || *status == 429,
        CliError::Remote { source, .. } => is_transient(source),
        _ => false,
    }
}

impl RetryPolicy {
    pub fn should_retry(&self, attempt: u32, error: &CliError) -> bool {
        attempt < self.max_retries && is_transient(error)
    }

    /// `min(initial_interval * multiplier^attempt, max_interval)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(i32::MAX as u32) as i32);
        let millis = self.initial_interval.as_millis() as f64 * factor;
        let capped = millis.min(self.max_interval.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Execute an async operation with retry.
    ///
    /// The closure is called until it succeeds, fails with a non-transient
    /// error, or the retries are exhausted; the last error is returned.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut f: F) -> CliResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = CliResult<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            "Operation succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !self.should_retry(attempt, &error) {
                        if is_transient(&error) {
                            warn!(
                                operation = operation_name,
                                attempts = attempt + 1,
                                error = %error,
                                "Max retries exceeded"
                            );
                        }
                        return Err(error);
                    }

                    let delay = self.delay_for(attempt);
                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying after transient error"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
