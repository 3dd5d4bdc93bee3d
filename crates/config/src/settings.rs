//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{generator, intent, messaging, sentiment, session};
use crate::{ConfigError, DialogueConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Intent corpus and classifier configuration
    #[serde(default)]
    pub intent: IntentConfig,

    /// Markov text generator configuration
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Sentiment collaborator configuration
    #[serde(default)]
    pub sentiment: SentimentConfig,

    /// Outbound messaging configuration
    #[serde(default)]
    pub messaging: MessagingConfig,

    /// Per-conversation session management
    #[serde(default)]
    pub session: SessionConfig,

    /// User-facing templates of the conversation graph
    #[serde(default)]
    pub dialogue: DialogueConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Intent classification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
    /// Labeled training documents (YAML/JSON mapping or two-column text)
    #[serde(default = "default_corpus_path")]
    pub corpus_path: String,

    /// Newline-delimited stopword list
    #[serde(default = "default_stopwords_path")]
    pub stopwords_path: String,

    /// Queries with at most this many words try the regex fast path
    #[serde(default = "default_fast_path_max_words")]
    pub fast_path_max_words: usize,

    #[serde(default = "default_ngram_min")]
    pub ngram_min: usize,

    #[serde(default = "default_ngram_max")]
    pub ngram_max: usize,

    /// Upper bound on one classification, including queueing for a worker
    #[serde(default = "default_intent_timeout_ms")]
    pub timeout_ms: u64,

    /// Concurrent classifications on the blocking pool
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_corpus_path() -> String {
    intent::CORPUS_PATH.to_string()
}

fn default_stopwords_path() -> String {
    intent::STOPWORDS_PATH.to_string()
}

fn default_fast_path_max_words() -> usize {
    intent::FAST_PATH_MAX_WORDS
}

fn default_ngram_min() -> usize {
    intent::NGRAM_MIN
}

fn default_ngram_max() -> usize {
    intent::NGRAM_MAX
}

fn default_intent_timeout_ms() -> u64 {
    intent::TIMEOUT_MS
}

fn default_workers() -> usize {
    intent::WORKERS
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            stopwords_path: default_stopwords_path(),
            fast_path_max_words: default_fast_path_max_words(),
            ngram_min: default_ngram_min(),
            ngram_max: default_ngram_max(),
            timeout_ms: default_intent_timeout_ms(),
            workers: default_workers(),
        }
    }
}

/// Markov generator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Training text files, concatenated in order
    #[serde(default = "default_generator_corpus_paths")]
    pub corpus_paths: Vec<String>,

    /// Hard cap on training tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_max_words")]
    pub max_words: usize,

    #[serde(default = "default_randomness_level")]
    pub randomness_level: usize,
}

fn default_generator_corpus_paths() -> Vec<String> {
    vec![generator::CORPUS_PATH.to_string()]
}

fn default_max_tokens() -> usize {
    generator::MAX_TRAINING_TOKENS
}

fn default_max_words() -> usize {
    generator::MAX_WORDS
}

fn default_randomness_level() -> usize {
    generator::RANDOMNESS_LEVEL
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            corpus_paths: default_generator_corpus_paths(),
            max_tokens: default_max_tokens(),
            max_words: default_max_words(),
            randomness_level: default_randomness_level(),
        }
    }
}

/// Sentiment collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    #[serde(default = "default_sentiment_timeout_ms")]
    pub timeout_ms: u64,

    /// Words counted as positive evidence by the lexicon analyzer
    #[serde(default = "default_positive_words")]
    pub positive_words: Vec<String>,

    /// Words counted as negative evidence by the lexicon analyzer
    #[serde(default = "default_negative_words")]
    pub negative_words: Vec<String>,
}

fn default_sentiment_timeout_ms() -> u64 {
    sentiment::TIMEOUT_MS
}

fn default_positive_words() -> Vec<String> {
    [
        "bien", "muy bien", "genial", "feliz", "contento", "contenta", "excelente", "gracias",
        "bueno", "buena", "encanta", "perfecto", "alegre", "😀", "🙂",
    ]
    .iter()
    .map(|w| w.to_string())
    .collect()
}

fn default_negative_words() -> Vec<String> {
    [
        "mal", "triste", "enojado", "enojada", "terrible", "horrible", "molesto", "molesta",
        "queja", "odio", "pesimo", "fatal", "cansado", "cansada", "😞", "🙁",
    ]
    .iter()
    .map(|w| w.to_string())
    .collect()
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_sentiment_timeout_ms(),
            positive_words: default_positive_words(),
            negative_words: default_negative_words(),
        }
    }
}

/// Outbound messaging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Send API endpoint; when unset messages are only logged
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Access token appended as `access_token` query parameter
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff, doubled on each retry
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_messaging_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_retries() -> u32 {
    messaging::MAX_RETRIES
}

fn default_initial_backoff_ms() -> u64 {
    messaging::INITIAL_BACKOFF_MS
}

fn default_messaging_timeout_ms() -> u64 {
    messaging::TIMEOUT_MS
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            access_token: None,
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            timeout_ms: default_messaging_timeout_ms(),
        }
    }
}

/// Session management settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    #[serde(default = "default_idle_timeout_seconds")]
    pub idle_timeout_seconds: u64,

    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// How long an ingress worker waits for its conversation's next message
    /// before retiring
    #[serde(default = "default_worker_idle_seconds")]
    pub worker_idle_seconds: u64,
}

fn default_max_sessions() -> usize {
    session::MAX_SESSIONS
}

fn default_idle_timeout_seconds() -> u64 {
    session::IDLE_TIMEOUT_SECONDS
}

fn default_cleanup_interval_seconds() -> u64 {
    session::CLEANUP_INTERVAL_SECONDS
}

fn default_worker_idle_seconds() -> u64 {
    session::WORKER_IDLE_SECONDS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_timeout_seconds: default_idle_timeout_seconds(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            worker_idle_seconds: default_worker_idle_seconds(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_intent()?;
        self.validate_generator()?;
        self.validate_collaborators()?;
        self.validate_session()?;
        self.validate_data_paths()?;
        Ok(())
    }

    fn validate_intent(&self) -> Result<(), ConfigError> {
        let intent = &self.intent;

        if intent.fast_path_max_words == 0 {
            return Err(invalid("intent.fast_path_max_words", "Must be at least 1"));
        }

        if intent.ngram_min == 0 {
            return Err(invalid("intent.ngram_min", "Must be at least 1"));
        }

        if intent.ngram_min > intent.ngram_max {
            return Err(invalid(
                "intent.ngram_max",
                format!(
                    "Must be >= ngram_min ({}), got {}",
                    intent.ngram_min, intent.ngram_max
                ),
            ));
        }

        if intent.timeout_ms == 0 {
            return Err(invalid("intent.timeout_ms", "Timeout must be at least 1ms"));
        }

        if intent.workers == 0 {
            return Err(invalid("intent.workers", "Must be at least 1"));
        }

        Ok(())
    }

    fn validate_generator(&self) -> Result<(), ConfigError> {
        let generator = &self.generator;

        if generator.corpus_paths.is_empty() {
            return Err(ConfigError::MissingField("generator.corpus_paths".to_string()));
        }

        if generator.max_tokens == 0 {
            return Err(invalid("generator.max_tokens", "Must be at least 1"));
        }

        if generator.max_words == 0 {
            return Err(invalid("generator.max_words", "Must be at least 1"));
        }

        if generator.randomness_level == 0 {
            return Err(invalid("generator.randomness_level", "Must be at least 1"));
        }

        Ok(())
    }

    fn validate_collaborators(&self) -> Result<(), ConfigError> {
        if self.sentiment.timeout_ms == 0 {
            return Err(invalid("sentiment.timeout_ms", "Timeout must be at least 1ms"));
        }

        if self.messaging.timeout_ms == 0 {
            return Err(invalid("messaging.timeout_ms", "Timeout must be at least 1ms"));
        }

        if self.messaging.endpoint.is_some() && self.messaging.access_token.is_none() {
            if self.environment.is_production() {
                return Err(invalid(
                    "messaging.access_token",
                    "Access token must be set when an endpoint is configured in production",
                ));
            }
            tracing::warn!("messaging.endpoint is set without an access token");
        }

        Ok(())
    }

    fn validate_session(&self) -> Result<(), ConfigError> {
        let session = &self.session;

        if session.max_sessions == 0 {
            return Err(invalid("session.max_sessions", "Must be at least 1"));
        }

        if session.idle_timeout_seconds == 0 {
            return Err(invalid("session.idle_timeout_seconds", "Must be at least 1 second"));
        }

        if session.cleanup_interval_seconds == 0 {
            return Err(invalid(
                "session.cleanup_interval_seconds",
                "Must be at least 1 second",
            ));
        }

        if session.worker_idle_seconds == 0 {
            return Err(invalid("session.worker_idle_seconds", "Must be at least 1 second"));
        }

        Ok(())
    }

    /// Missing data files are errors in staging/production and warnings in
    /// development (the loaders fail fast at startup either way)
    fn validate_data_paths(&self) -> Result<(), ConfigError> {
        let mut paths = vec![
            ("intent.corpus_path", self.intent.corpus_path.as_str()),
            ("intent.stopwords_path", self.intent.stopwords_path.as_str()),
        ];
        paths.extend(
            self.generator
                .corpus_paths
                .iter()
                .map(|p| ("generator.corpus_paths", p.as_str())),
        );

        let mut errors = Vec::new();
        for (field, path) in paths {
            if Path::new(path).is_file() {
                continue;
            }
            if self.environment.is_strict() {
                errors.push(format!("{}: file not found: {}", field, path));
            } else {
                tracing::warn!(field = field, path = path, "Data file not found");
            }
        }

        if !errors.is_empty() {
            return Err(ConfigError::FileNotFound(errors.join("; ")));
        }

        Ok(())
    }
}

/// Load settings from `config/default`, `config/{env}` and the environment
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Load settings rooted at a custom config directory
pub fn load_settings_from(dir: &str, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name(&format!("{}/default", dir)).required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("{}/{}", dir, env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("CHAT_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.intent.fast_path_max_words, 3);
        assert_eq!(settings.intent.ngram_min, 2);
        assert_eq!(settings.intent.ngram_max, 4);
        assert_eq!(settings.generator.max_tokens, 100_000);
        assert_eq!(settings.generator.randomness_level, 3);
        assert!(settings.messaging.endpoint.is_none());
    }

    #[test]
    fn test_default_settings_validate_in_development() {
        // Data files are absent in the test cwd; development only warns.
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_data_files_fail_in_production() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.intent.corpus_path = "/definitely/not/here.yaml".to_string();
        assert!(matches!(
            settings.validate_data_paths(),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_ngram_range_validation() {
        let mut settings = Settings::default();
        settings.intent.ngram_min = 5;
        settings.intent.ngram_max = 4;
        let err = settings.validate_intent().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "intent.ngram_max"));

        settings.intent.ngram_min = 0;
        assert!(settings.validate_intent().is_err());
    }

    #[test]
    fn test_generator_validation() {
        let mut settings = Settings::default();
        settings.generator.randomness_level = 0;
        assert!(settings.validate_generator().is_err());

        settings.generator.randomness_level = 1;
        settings.generator.corpus_paths.clear();
        assert!(matches!(
            settings.validate_generator(),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn test_session_validation() {
        let mut settings = Settings::default();
        settings.session.max_sessions = 0;
        assert!(settings.validate_session().is_err());

        let mut settings = Settings::default();
        settings.session.worker_idle_seconds = 0;
        assert!(settings.validate_session().is_err());
    }

    #[test]
    fn test_production_requires_access_token() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.messaging.endpoint = Some("https://example.invalid/send".to_string());
        settings.messaging.access_token = None;
        assert!(settings.validate_collaborators().is_err());

        settings.messaging.access_token = Some("token".to_string());
        assert!(settings.validate_collaborators().is_ok());
    }

    #[test]
    fn test_load_settings_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.yaml"),
            r#"
intent:
  fast_path_max_words: 2
  timeout_ms: 750
generator:
  max_words: 8
dialogue:
  greeting: "Buenas, {name}"
"#,
        )
        .unwrap();

        let settings = load_settings_from(dir.path().to_str().unwrap(), None).unwrap();
        assert_eq!(settings.intent.fast_path_max_words, 2);
        assert_eq!(settings.intent.timeout_ms, 750);
        assert_eq!(settings.intent.ngram_max, 4);
        assert_eq!(settings.generator.max_words, 8);
        assert_eq!(settings.dialogue.greeting, "Buenas, {name}");
    }

    #[test]
    fn test_environment_overlay() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("default.yaml"), "intent:\n  workers: 2\n").unwrap();
        std::fs::write(dir.path().join("staging.yaml"), "intent:\n  workers: 8\n").unwrap();

        // staging is strict about data files, so only load the overlay here
        let root = dir.path().to_str().unwrap();
        let base = load_settings_from(root, None).unwrap();
        assert_eq!(base.intent.workers, 2);

        let overlay = Config::builder()
            .add_source(File::with_name(&format!("{}/default", root)))
            .add_source(File::with_name(&format!("{}/staging", root)))
            .build()
            .unwrap()
            .try_deserialize::<Settings>()
            .unwrap();
        assert_eq!(overlay.intent.workers, 8);
    }
}
