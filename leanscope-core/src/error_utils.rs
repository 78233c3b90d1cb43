use crate::error::*;
use std::fmt::{Debug, Display};
use std::time::Duration;
use tracing::{error, info, warn};

/// Delay used for retryable errors that carry no hint of their own.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Classification and reporting helpers shared by every error enum.
///
/// Only `error_code` and `user_friendly_message` are required; local
/// errors (files, config, training data) are never retryable.
pub trait ErrorExt: Display + Debug {
    fn error_code(&self) -> &'static str;

    fn user_friendly_message(&self) -> String;

    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        self.is_retryable().then_some(DEFAULT_RETRY_AFTER)
    }

    fn log_error(&self) -> &Self {
        error!("[{}] {}", self.error_code(), self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("[{}] {}", self.error_code(), self);
        self
    }
}

impl ErrorExt for CoreError {
    fn error_code(&self) -> &'static str {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API",
            CoreError::Store(_) => "STORE",
            CoreError::Sentiment(_) => "SENTIMENT",
            CoreError::Classifier(_) => "CLASSIFIER",
            CoreError::Config(_) => "CONFIG",
            CoreError::Io(_) => "IO",
            CoreError::Serialization(_) => "SERIALIZATION",
            CoreError::Network(_) => "NETWORK",
            CoreError::InvalidInput { .. } => "INVALID_INPUT",
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::Internal { .. } => "INTERNAL",
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Store(e) => e.user_friendly_message(),
            CoreError::Sentiment(e) => e.user_friendly_message(),
            CoreError::Classifier(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::InvalidInput { message } => format!("Invalid input: {}", message),
            CoreError::NotFound { resource } => format!("Could not find: {}", resource),
            _ => "An unexpected error occurred.".to_string(),
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::RedditApi(e) => e.is_retryable(),
            CoreError::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::RedditApi(e) => e.retry_after(),
            _ => self.is_retryable().then_some(DEFAULT_RETRY_AFTER),
        }
    }

    /// Logs the wrapped error's debug form as well.
    fn log_error(&self) -> &Self {
        error!("[{}] {}", self.error_code(), self);
        match self {
            CoreError::RedditApi(e) => error!("details: {:?}", e),
            CoreError::Store(e) => error!("details: {:?}", e),
            CoreError::Sentiment(e) => error!("details: {:?}", e),
            CoreError::Classifier(e) => error!("details: {:?}", e),
            CoreError::Config(e) => error!("details: {:?}", e),
            _ => {}
        }
        self
    }
}

impl ErrorExt for RedditApiError {
    fn error_code(&self) -> &'static str {
        match self {
            RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED",
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT",
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN",
            RedditApiError::SubredditNotFound { .. } => "REDDIT_SUBREDDIT_NOT_FOUND",
            RedditApiError::PostNotFound { .. } => "REDDIT_POST_NOT_FOUND",
            RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN",
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT",
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE",
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR",
            RedditApiError::DuplicateExpansion { .. } => "REDDIT_DUPLICATE_EXPANSION",
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => {
                "Reddit authentication failed. Please check your credentials.".to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => format!(
                "Access denied to {}. You may not have permission to view this content.",
                resource
            ),
            RedditApiError::SubredditNotFound { subreddit } => {
                format!("Subreddit '{}' not found or is private.", subreddit)
            }
            RedditApiError::PostNotFound { .. } => {
                "The requested post could not be found.".to_string()
            }
            RedditApiError::InvalidToken => {
                "Reddit authentication token is invalid. Please re-authenticate.".to_string()
            }
            RedditApiError::RequestTimeout => {
                "Request to Reddit timed out. Please try again.".to_string()
            }
            RedditApiError::DuplicateExpansion { post_id } => format!(
                "Comments for post {} were already expanded; keeping what was fetched.",
                post_id
            ),
            _ => "Reddit API error occurred. Please try again later.".to_string(),
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            RedditApiError::RateLimitExceeded { .. } | RedditApiError::RequestTimeout => true,
            RedditApiError::ServerError { status_code } => *status_code >= 500,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            RedditApiError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ => self.is_retryable().then_some(DEFAULT_RETRY_AFTER),
        }
    }
}

impl ErrorExt for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            StoreError::FileNotFound { .. } => "STORE_FILE_NOT_FOUND",
            StoreError::MissingColumn { .. } => "STORE_MISSING_COLUMN",
            StoreError::ColumnLength { .. } => "STORE_COLUMN_LENGTH",
            StoreError::InvalidValue { .. } => "STORE_INVALID_VALUE",
            StoreError::Csv(_) => "STORE_CSV",
            StoreError::Io { .. } => "STORE_IO",
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            StoreError::FileNotFound { path } => {
                format!("Could not find {}, skipping.", path.display())
            }
            StoreError::MissingColumn { column, path } => format!(
                "{} has no '{}' column. Was the previous stage run?",
                path.display(),
                column
            ),
            StoreError::ColumnLength { path, .. } => {
                format!("Column length does not match the rows of {}.", path.display())
            }
            StoreError::InvalidValue { column, value } => {
                format!("'{}' is not a valid value for column '{}'.", value, column)
            }
            StoreError::Csv(_) => "A CSV file could not be read or written.".to_string(),
            StoreError::Io { path, .. } => format!("Could not access {}.", path.display()),
        }
    }
}

impl ErrorExt for SentimentError {
    fn error_code(&self) -> &'static str {
        match self {
            SentimentError::MissingResult { .. } => "SENTIMENT_MISSING_RESULT",
            SentimentError::MalformedLine { .. } => "SENTIMENT_MALFORMED_LINE",
            SentimentError::ManifestMissing { .. } => "SENTIMENT_MANIFEST_MISSING",
            SentimentError::ExportMissing { .. } => "SENTIMENT_EXPORT_MISSING",
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            SentimentError::MissingResult { expected, .. } => format!(
                "The sentiment tool did not produce {}. Run it on the export folder first.",
                expected.display()
            ),
            SentimentError::MalformedLine { path, line, .. } => format!(
                "Line {} of {} does not end in two tab-separated integers.",
                line,
                path.display()
            ),
            SentimentError::ManifestMissing { dir } => format!(
                "{} has no manifest.json. Re-run the export step.",
                dir.display()
            ),
            SentimentError::ExportMissing { dir } => format!(
                "Export folder {} does not exist. Run the export step first.",
                dir.display()
            ),
        }
    }
}

impl ErrorExt for ClassifierError {
    fn error_code(&self) -> &'static str {
        match self {
            ClassifierError::TrainingDataNotFound { .. } => "CLASSIFIER_DATA_NOT_FOUND",
            ClassifierError::UnsupportedFormat { .. } => "CLASSIFIER_UNSUPPORTED_FORMAT",
            ClassifierError::MissingLabelColumn { .. } => "CLASSIFIER_MISSING_COLUMN",
            ClassifierError::Spreadsheet { .. } => "CLASSIFIER_SPREADSHEET",
            ClassifierError::NotEnoughExamples { .. } => "CLASSIFIER_NOT_ENOUGH_DATA",
            ClassifierError::EmptyVocabulary => "CLASSIFIER_EMPTY_VOCABULARY",
            ClassifierError::NotFitted => "CLASSIFIER_NOT_FITTED",
            ClassifierError::DimensionMismatch { .. } => "CLASSIFIER_DIMENSION",
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ClassifierError::TrainingDataNotFound { path } => {
                format!("Training data {} does not exist.", path.display())
            }
            ClassifierError::UnsupportedFormat { extension } => format!(
                "Training data must be a spreadsheet or .csv, got '{}'.",
                extension
            ),
            ClassifierError::MissingLabelColumn { column } => {
                format!("Training data needs a '{}' column.", column)
            }
            ClassifierError::NotEnoughExamples { label, count } => format!(
                "Only {} '{}' examples; at least two are needed to train and evaluate.",
                count, label
            ),
            _ => "The classifier could not be trained.".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND",
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD",
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED",
            ConfigError::Parse(_) => "CONFIG_PARSE",
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => format!("Config file {} not found.", path),
            ConfigError::MissingField { field } => format!(
                "Missing required setting '{}'. Set it in the environment or config file.",
                field
            ),
            ConfigError::InvalidValue { field, value } => {
                format!("'{}' is not a valid value for '{}'.", value, field)
            }
            ConfigError::ValidationFailed { reason } => {
                format!("Invalid configuration: {}", reason)
            }
            ConfigError::Parse(_) => "The config file is not valid TOML.".to_string(),
        }
    }
}

/// Logs a failed stage with its code and a message meant for the operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorReporter;

impl ErrorReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report_error(&self, error: &CoreError) {
        error.log_error();
        info!("{}", error.user_friendly_message());
    }

    /// For errors that only skip the current unit of work.
    pub fn report_warning(&self, error: &CoreError) {
        error.log_warn();
        info!("{}", error.user_friendly_message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_errors_use_trait_defaults() {
        let err = SentimentError::ManifestMissing {
            dir: "politicstxt".into(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.retry_after(), None);
        assert_eq!(err.error_code(), "SENTIMENT_MANIFEST_MISSING");
    }

    #[test]
    fn test_server_errors_fall_back_to_default_delay() {
        let err = RedditApiError::ServerError { status_code: 503 };
        assert_eq!(err.retry_after(), Some(DEFAULT_RETRY_AFTER));

        let client_side = RedditApiError::ServerError { status_code: 404 };
        assert_eq!(client_side.retry_after(), None);
    }
}
