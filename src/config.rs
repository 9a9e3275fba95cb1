//! Configuration loading and management for wikiquiz.
//!
//! Loads settings from `wikiquiz.toml` with environment variable overrides.
//! A missing config file is not an error: every section has defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Upper bound on questions per quiz, regardless of configuration
pub const MAX_QUESTIONS: usize = 5;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Encyclopedia API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// MediaWiki `api.php` endpoint used for plain titles
    pub endpoint: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Extra attempts after a transport failure
    pub retries: u32,
}

/// Quiz generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Number of questions to generate (capped at five)
    pub max_questions: usize,
}

/// Storage paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base path for data storage
    pub path: PathBuf,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from the default location (wikiquiz.toml in cwd or home)
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::debug!("loading config from {}", path.display());
                Self::parse(&std::fs::read_to_string(path)?)?
            }
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        config.apply_env();
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Override settings from environment variables
    fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var("WIKIQUIZ_API_ENDPOINT") {
            self.api.endpoint = endpoint;
        }
        if let Ok(dir) = std::env::var("WIKIQUIZ_DATA_DIR") {
            self.storage.path = PathBuf::from(dir);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from("wikiquiz.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        let home_config = dirs::home_dir()?
            .join(".config")
            .join("wikiquiz")
            .join("wikiquiz.toml");
        home_config.exists().then_some(home_config)
    }

    /// Number of questions a quiz should hold
    pub fn question_count(&self) -> usize {
        self.quiz.max_questions.clamp(1, MAX_QUESTIONS)
    }

    /// Location of the sled history database
    pub fn history_path(&self) -> PathBuf {
        self.storage.path.join("history")
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://en.wikipedia.org/w/api.php".to_string(),
            timeout_secs: 30,
            retries: 2,
        }
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            max_questions: MAX_QUESTIONS,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|dir| dir.join("wikiquiz"))
            .unwrap_or_else(|| PathBuf::from("./data"));
        Self { path }
    }
}
