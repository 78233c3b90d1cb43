use leanscope_core::{CoreError, ErrorRecovery, RecoveryStrategy};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Fixed delay between attempts, never grows
    pub delay: Duration,
    /// Ceiling on attempts; `None` retries for as long as the error stays transient
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

impl RetryConfig {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }
}

/// Retry metrics for the end-of-run summary
#[derive(Debug, Clone, Default)]
pub struct RetryMetrics {
    pub total_retries: u64,
    pub rate_limited: u64,
    pub successful_retries: u64,
    pub total_delay: Duration,
}

/// Retry executor that wraps API calls with fixed-delay retries
#[derive(Debug)]
pub struct RetryExecutor {
    config: RetryConfig,
    metrics: Arc<Mutex<RetryMetrics>>,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(Mutex::new(RetryMetrics::default())),
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute an operation, retrying rate limits and transient server
    /// errors after the fixed delay. Every other error is returned as-is so
    /// the caller can decide to skip, abandon or fail.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut attempt: u32 = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        self.record(|m| m.successful_retries += 1);
                        info!("{} succeeded after {} retries", operation_name, attempt);
                    }
                    return Ok(result);
                }
                Err(error) => {
                    let strategy = ErrorRecovery::determine_strategy(&error, self.config.delay);
                    let RecoveryStrategy::RetryAfter(delay) = strategy else {
                        debug!("Not retrying {}: {}", operation_name, error);
                        return Err(error);
                    };

                    attempt += 1;
                    if let Some(max) = self.config.max_attempts {
                        if attempt >= max {
                            warn!("Giving up on {} after {} attempts: {}", operation_name, attempt, error);
                            return Err(error);
                        }
                    }

                    let rate_limited = matches!(
                        error,
                        CoreError::RedditApi(leanscope_core::RedditApiError::RateLimitExceeded { .. })
                    );
                    self.record(|m| {
                        m.total_retries += 1;
                        m.total_delay += delay;
                        if rate_limited {
                            m.rate_limited += 1;
                        }
                    });

                    warn!(
                        "{} stopped due to {}, retrying in {:?} (attempt {})",
                        operation_name, error, delay, attempt
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    fn record(&self, update: impl FnOnce(&mut RetryMetrics)) {
        if let Ok(mut metrics) = self.metrics.lock() {
            update(&mut *metrics);
        }
    }

    /// Get current retry metrics
    pub fn get_metrics(&self) -> RetryMetrics {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}
