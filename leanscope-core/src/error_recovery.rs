//! Error recovery strategies for the batch stages.
//!
//! Every stage handles failures the same way: a transient Reddit failure is
//! retried after a fixed delay with no ceiling, a duplicate comment expansion
//! abandons only the current expansion, a missing or malformed unit of work
//! is skipped, and anything else terminates the run.

use crate::{CoreError, RedditApiError, SentimentError, StoreError};
use std::time::Duration;

/// Recovery strategy for handling errors
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryStrategy {
    /// Sleep for the fixed delay, then try the same call again
    RetryAfter(Duration),
    /// Stop the current sub-step, keep what it produced, continue the run
    AbandonStep,
    /// Drop the current unit of work (record, file) and continue
    Skip,
    /// Propagate the error and stop the run
    Fail,
}

impl RecoveryStrategy {
    pub fn is_retry(&self) -> bool {
        matches!(self, RecoveryStrategy::RetryAfter(_))
    }
}

/// Error recovery handler that maps the error taxonomy to a strategy
pub struct ErrorRecovery;

impl ErrorRecovery {
    /// Determine the recovery strategy for an error. `retry_delay` is the
    /// fixed delay used for every retryable failure.
    pub fn determine_strategy(error: &CoreError, retry_delay: Duration) -> RecoveryStrategy {
        match error {
            CoreError::RedditApi(reddit_error) => match reddit_error {
                RedditApiError::RateLimitExceeded { .. } | RedditApiError::RequestTimeout => {
                    RecoveryStrategy::RetryAfter(retry_delay)
                }
                RedditApiError::ServerError { status_code } if *status_code >= 500 => {
                    RecoveryStrategy::RetryAfter(retry_delay)
                }
                RedditApiError::DuplicateExpansion { .. } => RecoveryStrategy::AbandonStep,
                RedditApiError::InvalidResponse { .. } => RecoveryStrategy::Skip,
                _ => RecoveryStrategy::Fail,
            },

            CoreError::Network(reqwest_error) => {
                if reqwest_error.is_timeout() || reqwest_error.is_connect() {
                    RecoveryStrategy::RetryAfter(retry_delay)
                } else {
                    RecoveryStrategy::Fail
                }
            }

            CoreError::Store(store_error) => match store_error {
                StoreError::FileNotFound { .. }
                | StoreError::Io { .. }
                | StoreError::InvalidValue { .. } => RecoveryStrategy::Skip,
                _ => RecoveryStrategy::Fail,
            },

            CoreError::Sentiment(sentiment_error) => match sentiment_error {
                SentimentError::MissingResult { .. } | SentimentError::MalformedLine { .. } => {
                    RecoveryStrategy::Skip
                }
                _ => RecoveryStrategy::Fail,
            },

            CoreError::NotFound { .. } => RecoveryStrategy::Skip,

            _ => RecoveryStrategy::Fail,
        }
    }
}
