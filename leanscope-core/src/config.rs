use crate::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_RETRY_DELAY_SECS: u64 = 1;
pub const DEFAULT_RESULT_SUFFIX: &str = "+results.txt";
pub const DEFAULT_USER_AGENT: &str = "leanscope/0.1";

/// Credentials of a Reddit "script" application.
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

/// Optional TOML config file. Every key may also come from the environment,
/// which takes precedence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub reddit: RedditSection,
    pub data_dir: Option<PathBuf>,
    pub retry_delay_secs: Option<u64>,
    pub result_suffix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RedditSection {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_agent: Option<String>,
}

/// Application configuration. Secrets only come from the environment or the
/// config file, never from source.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_username: Option<String>,
    pub reddit_password: Option<String>,
    pub reddit_user_agent: String,
    pub data_dir: PathBuf,
    pub retry_delay: Duration,
    pub result_suffix: String,
}

impl AppConfig {
    /// Loads `.env`, then the optional TOML file, then the process
    /// environment on top.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let file = match config_path {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };

        let config = Self::from_sources(file, |key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let retry_delay_secs = match env("LEANSCOPE_RETRY_DELAY_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                field: "LEANSCOPE_RETRY_DELAY_SECS".to_string(),
                value: raw.clone(),
            })?,
            None => file.retry_delay_secs.unwrap_or(DEFAULT_RETRY_DELAY_SECS),
        };

        let config = Self {
            reddit_client_id: env("REDDIT_CLIENT_ID").or(file.reddit.client_id),
            reddit_client_secret: env("REDDIT_CLIENT_SECRET").or(file.reddit.client_secret),
            reddit_username: env("REDDIT_USERNAME").or(file.reddit.username),
            reddit_password: env("REDDIT_PASSWORD").or(file.reddit.password),
            reddit_user_agent: env("REDDIT_USER_AGENT")
                .or(file.reddit.user_agent)
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            data_dir: env("LEANSCOPE_DATA_DIR")
                .map(PathBuf::from)
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            retry_delay: Duration::from_secs(retry_delay_secs),
            result_suffix: env("LEANSCOPE_RESULT_SUFFIX")
                .or(file.result_suffix)
                .unwrap_or_else(|| DEFAULT_RESULT_SUFFIX.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.result_suffix.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "result suffix must not be empty".to_string(),
            });
        }
        if self.reddit_user_agent.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "user agent must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Credentials needed by the collector; other stages run without them.
    pub fn reddit_credentials(&self) -> Result<RedditCredentials, ConfigError> {
        fn required(value: &Option<String>, field: &str) -> Result<String, ConfigError> {
            match value {
                Some(v) if !v.is_empty() => Ok(v.clone()),
                _ => Err(ConfigError::MissingField {
                    field: field.to_string(),
                }),
            }
        }

        Ok(RedditCredentials {
            client_id: required(&self.reddit_client_id, "REDDIT_CLIENT_ID")?,
            client_secret: required(&self.reddit_client_secret, "REDDIT_CLIENT_SECRET")?,
            username: required(&self.reddit_username, "REDDIT_USERNAME")?,
            password: required(&self.reddit_password, "REDDIT_PASSWORD")?,
            user_agent: self.reddit_user_agent.clone(),
        })
    }

    fn log_keys(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    let n = v.chars().count().min(3);
                    let head: String = v.chars().take(n).collect();
                    format!("{}...({} chars)", head, v.chars().count())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  REDDIT_CLIENT_ID: {}", preview_opt(&self.reddit_client_id));
        tracing::info!("  REDDIT_CLIENT_SECRET: {}", preview_opt(&self.reddit_client_secret));
        tracing::info!("  REDDIT_USERNAME: {}", preview_opt(&self.reddit_username));
        tracing::info!("  REDDIT_USER_AGENT: {}", self.reddit_user_agent);
        tracing::info!("  LEANSCOPE_DATA_DIR: {}", self.data_dir.display());
        tracing::info!("  LEANSCOPE_RETRY_DELAY_SECS: {}", self.retry_delay.as_secs());
        tracing::info!("  LEANSCOPE_RESULT_SUFFIX: {}", self.result_suffix);
    }
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Ok(toml::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_any_source() {
        let config = AppConfig::from_sources(FileConfig::default(), env_from(&[])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.retry_delay, Duration::from_secs(DEFAULT_RETRY_DELAY_SECS));
        assert_eq!(config.result_suffix, DEFAULT_RESULT_SUFFIX);
        assert_eq!(config.reddit_user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_missing_credentials_reported_by_field() {
        let config = AppConfig::from_sources(
            FileConfig::default(),
            env_from(&[("REDDIT_CLIENT_ID", "id"), ("REDDIT_CLIENT_SECRET", "secret")]),
        )
        .unwrap();

        match config.reddit_credentials() {
            Err(ConfigError::MissingField { field }) => assert_eq!(field, "REDDIT_USERNAME"),
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_environment_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
            data_dir = "from-file"
            retry_delay_secs = 5

            [reddit]
            client_id = "file-id"
            client_secret = "file-secret"
            username = "file-user"
            password = "file-pass"
            "#,
        )
        .unwrap();

        let config = AppConfig::from_sources(
            file,
            env_from(&[("REDDIT_CLIENT_ID", "env-id"), ("LEANSCOPE_DATA_DIR", "from-env")]),
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("from-env"));
        assert_eq!(config.retry_delay, Duration::from_secs(5));

        let creds = config.reddit_credentials().unwrap();
        assert_eq!(creds.client_id, "env-id");
        assert_eq!(creds.client_secret, "file-secret");
        assert_eq!(creds.username, "file-user");
    }

    #[test]
    fn test_invalid_retry_delay_rejected() {
        let result = AppConfig::from_sources(
            FileConfig::default(),
            env_from(&[("LEANSCOPE_RETRY_DELAY_SECS", "soon")]),
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_config_file_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("leanscope.toml");
        std::fs::write(&path, "result_suffix = \".out\"\n\n[reddit]\nuser_agent = \"test-agent\"\n")
            .unwrap();

        let file = FileConfig::from_path(&path).unwrap();
        let config = AppConfig::from_sources(file, env_from(&[])).unwrap();
        assert_eq!(config.result_suffix, ".out");
        assert_eq!(config.reddit_user_agent, "test-agent");
        assert!(config.reddit_credentials().is_err());
    }

    #[test]
    fn test_malformed_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "retry_delay_secs = \"soon\"\n").unwrap();
        assert!(FileConfig::from_path(&path).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let result = FileConfig::from_path(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }
}
