//! Application State
//!
//! Builds every model and collaborator from [`Settings`] once at startup.
//! Any failure aborts startup.

use std::sync::Arc;
use std::time::Duration;

use chat_agent_agent::{Collaborators, GenerationSettings, IntentClassifier, StateGraph};
use chat_agent_config::Settings;
use chat_agent_core::{Messenger, SentimentClassifier};
use chat_agent_text_processing::{
    load_training_examples, IntentCorpus, IntentParser, MarkovTextGenerator, ParserConfig,
    SentimentAnalyzer, SentimentConfig, StopwordCleaner,
};

use crate::session::SessionManager;
use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub graph: Arc<StateGraph>,
    pub collaborators: Arc<Collaborators>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    /// Load data files and build the full object graph
    pub fn build(config: Settings) -> Result<Self, ServerError> {
        let messenger = chat_agent_transport::build_messenger(&config.messaging)?;
        Self::build_with_messenger(config, messenger)
    }

    /// Same as [`AppState::build`] with a caller-supplied messenger
    pub fn build_with_messenger(
        config: Settings,
        messenger: Arc<dyn Messenger>,
    ) -> Result<Self, ServerError> {
        let cleaner = StopwordCleaner::from_file(&config.intent.stopwords_path)?;
        tracing::info!(
            path = %config.intent.stopwords_path,
            stopwords = cleaner.len(),
            "Loaded stopwords"
        );

        let examples = load_training_examples(&config.intent.corpus_path)?;
        let corpus = IntentCorpus::build(examples, &cleaner)?;
        tracing::info!(
            path = %config.intent.corpus_path,
            intents = corpus.len(),
            labels = ?corpus.labels(),
            "Loaded intent corpus"
        );

        let graph = StateGraph::reference(&config.dialogue)?;
        graph.validate_intents(&corpus)?;

        let parser = Arc::new(IntentParser::new(
            corpus,
            ParserConfig {
                fast_path_max_words: config.intent.fast_path_max_words,
                ngram_min: config.intent.ngram_min,
                ngram_max: config.intent.ngram_max,
            },
        ));
        let classifier = Arc::new(IntentClassifier::new(
            parser,
            config.intent.workers,
            Duration::from_millis(config.intent.timeout_ms),
        ));

        let generator = Arc::new(MarkovTextGenerator::from_files(
            &config.generator.corpus_paths,
            config.generator.max_tokens,
        )?);
        tracing::info!(
            states = generator.model().states().len(),
            tokens = generator.model().total_tokens(),
            "Trained Markov generator"
        );

        let sentiment: Arc<dyn SentimentClassifier> =
            Arc::new(SentimentAnalyzer::new(SentimentConfig {
                positive_words: config.sentiment.positive_words.clone(),
                negative_words: config.sentiment.negative_words.clone(),
            })?);

        tracing::info!(messenger = messenger.name(), "Messaging transport ready");

        let collaborators = Arc::new(Collaborators::new(
            messenger,
            sentiment,
            Duration::from_millis(config.sentiment.timeout_ms),
            classifier,
            generator,
            GenerationSettings {
                max_words: config.generator.max_words,
                randomness_level: config.generator.randomness_level,
            },
        ));

        Ok(Self::from_parts(config, Arc::new(graph), collaborators))
    }

    /// Assemble state from already-built parts
    pub fn from_parts(
        config: Settings,
        graph: Arc<StateGraph>,
        collaborators: Arc<Collaborators>,
    ) -> Self {
        let sessions = Arc::new(SessionManager::with_config(
            Arc::clone(&graph),
            Arc::clone(&collaborators),
            config.session.max_sessions,
            Duration::from_secs(config.session.idle_timeout_seconds),
            Duration::from_secs(config.session.cleanup_interval_seconds),
        ));
        Self {
            config: Arc::new(config),
            graph,
            collaborators,
            sessions,
        }
    }
}
