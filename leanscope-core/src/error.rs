use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Sentiment error: {0}")]
    Sentiment(#[from] SentimentError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Subreddit not found: {subreddit}")]
    SubredditNotFound { subreddit: String },

    #[error("Post not found: {post_id}")]
    PostNotFound { post_id: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },

    #[error("Comment expansion already requested for post {post_id}")]
    DuplicateExpansion { post_id: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Missing column {column} in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("Column length mismatch in {path}: {rows} rows, {values} values")]
    ColumnLength {
        path: PathBuf,
        rows: usize,
        values: usize,
    },

    #[error("Invalid value {value:?} in column {column}")]
    InvalidValue { column: String, value: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum SentimentError {
    #[error("No result file for {stem} (expected {expected})")]
    MissingResult { stem: String, expected: PathBuf },

    #[error("Malformed result line {line} in {path}: {content:?}")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("Export manifest not found in {dir}")]
    ManifestMissing { dir: PathBuf },

    #[error("Export folder not found: {dir}")]
    ExportMissing { dir: PathBuf },
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Training data not found: {path}")]
    TrainingDataNotFound { path: PathBuf },

    #[error("Unsupported training data format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Training data is missing the {column} column")]
    MissingLabelColumn { column: String },

    #[error("Spreadsheet error: {reason}")]
    Spreadsheet { reason: String },

    #[error("Need at least two examples of each label, got {label}: {count}")]
    NotEnoughExamples { label: String, count: usize },

    #[error("Vocabulary is empty after preprocessing")]
    EmptyVocabulary,

    #[error("Model has not been fitted yet")]
    NotFitted,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
