//! Configuration management for the chat agent
//!
//! Supports loading configuration from:
//! - YAML/TOML/JSON files (`config/default`, `config/{env}`)
//! - Environment variables (CHAT_AGENT_ prefix, `__` separator)
//! - Runtime overrides
//!
//! Data resources (intent corpus, stopwords, Markov training text) are only
//! referenced by path here; the text_processing crate loads them.

pub mod constants;
pub mod dialogue;
pub mod settings;

pub use dialogue::{DialogueConfig, QuickReplyConfig};
pub use settings::{
    load_settings, load_settings_from, GeneratorConfig, IntentConfig, LogFormat, MessagingConfig,
    ObservabilityConfig, RuntimeEnvironment, SentimentConfig, SessionConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
