use leanscope_core::{
    ClassifierError, ConfigError, CoreError, ErrorExt, ErrorReporter, RedditApiError,
    SentimentError, StoreError,
};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(reddit_error.error_code(), "REDDIT_API");

    let store_error = CoreError::Store(StoreError::FileNotFound {
        path: PathBuf::from("politics.csv"),
    });
    assert_eq!(store_error.error_code(), "STORE");

    let sentiment_error = CoreError::Sentiment(SentimentError::ManifestMissing {
        dir: PathBuf::from("politicstxt"),
    });
    assert_eq!(sentiment_error.error_code(), "SENTIMENT");

    let classifier_error = CoreError::Classifier(ClassifierError::EmptyVocabulary);
    assert_eq!(classifier_error.error_code(), "CLASSIFIER");

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "REDDIT_CLIENT_ID".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");
}

#[test]
fn test_retryable_errors() {
    let retryable_error =
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert!(retryable_error.is_retryable());

    let server_error = CoreError::RedditApi(RedditApiError::ServerError { status_code: 502 });
    assert!(server_error.is_retryable());

    let duplicate = CoreError::RedditApi(RedditApiError::DuplicateExpansion {
        post_id: "abc123".to_string(),
    });
    assert!(!duplicate.is_retryable());

    let non_retryable_error = CoreError::Config(ConfigError::MissingField {
        field: "REDDIT_PASSWORD".to_string(),
    });
    assert!(!non_retryable_error.is_retryable());
}

#[test]
fn test_retry_after() {
    let rate_limit_error =
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert_eq!(
        rate_limit_error.retry_after(),
        Some(Duration::from_secs(60))
    );

    let missing = CoreError::NotFound {
        resource: "politics".to_string(),
    };
    assert_eq!(missing.retry_after(), None);
}

#[test]
fn test_user_friendly_messages() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    let message = reddit_error.user_friendly_message();
    assert!(message.contains("authentication token is invalid"));

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "REDDIT_CLIENT_SECRET".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("REDDIT_CLIENT_SECRET"));

    let store_error = CoreError::Store(StoreError::MissingColumn {
        column: "positiveSentiment".to_string(),
        path: PathBuf::from("politics/title.csv"),
    });
    assert!(store_error.user_friendly_message().contains("positiveSentiment"));
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new();
    let error = CoreError::RedditApi(RedditApiError::InvalidToken);

    // This test just ensures the methods don't panic
    reporter.report_error(&error);
    reporter.report_warning(&error);
}
