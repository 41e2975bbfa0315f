//! Engine configuration
//!
//! Loaded from JSON; every field has a default so a partial (or empty)
//! document is valid.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Parse(_) => "TAB_CONFIG_PARSE",
            ConfigError::Invalid(_) => "TAB_CONFIG_INVALID",
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Index entries buffered before a flush, and the page size of index
    /// scans when a request gives none (default: 1000)
    #[serde(default = "default_index_batch_size")]
    pub index_batch_size: usize,

    /// First batch-sequence number of an object with no counter (default: 0)
    #[serde(default = "default_min_batch_sequence")]
    pub min_batch_sequence: u64,

    /// Object attribute holding the next unassigned batch-sequence number
    #[serde(default = "default_sequence_attr")]
    pub sequence_attr: String,

    /// Characters that split text-index tokens (default: whitespace)
    #[serde(default = "default_text_delimiters")]
    pub text_delimiters: String,

    /// Words dropped by text indexes that ask for stopword removal
    #[serde(default = "default_stopwords")]
    pub stopwords: Vec<String>,

    #[serde(default = "default_name")]
    pub default_db_name: String,

    #[serde(default = "default_name")]
    pub default_table_name: String,
}

fn default_index_batch_size() -> usize {
    1000
}

fn default_min_batch_sequence() -> u64 {
    0
}

fn default_sequence_attr() -> String {
    "_seq_num".to_string()
}

fn default_text_delimiters() -> String {
    " \t\n\r".to_string()
}

fn default_stopwords() -> Vec<String> {
    [
        "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
        "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
        "these", "they", "this", "to", "was", "will", "with",
    ]
    .iter()
    .map(|w| w.to_string())
    .collect()
}

fn default_name() -> String {
    "*".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_batch_size: default_index_batch_size(),
            min_batch_sequence: default_min_batch_sequence(),
            sequence_attr: default_sequence_attr(),
            text_delimiters: default_text_delimiters(),
            stopwords: default_stopwords(),
            default_db_name: default_name(),
            default_table_name: default_name(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON config document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index_batch_size == 0 {
            return Err(ConfigError::Invalid("index_batch_size must be positive".into()));
        }
        if self.sequence_attr.trim().is_empty() {
            return Err(ConfigError::Invalid("sequence_attr must not be empty".into()));
        }
        Ok(())
    }

    /// Config with a different flush/page size
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            index_batch_size: batch_size,
            ..Default::default()
        }
    }

    /// `name`, or the default db name when blank
    pub fn db_name<'a>(&'a self, name: &'a str) -> &'a str {
        if name.trim().is_empty() {
            &self.default_db_name
        } else {
            name.trim()
        }
    }

    /// `name`, or the default table name when blank
    pub fn table_name<'a>(&'a self, name: &'a str) -> &'a str {
        if name.trim().is_empty() {
            &self.default_table_name
        } else {
            name.trim()
        }
    }
}
