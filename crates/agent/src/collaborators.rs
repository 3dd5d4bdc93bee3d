//! External capabilities a conversation turn depends on

use std::sync::Arc;
use std::time::Duration;

use chat_agent_core::{Messenger, Sentiment, SentimentClassifier};
use chat_agent_text_processing::{IntentOutcome, MarkovTextGenerator};

use crate::classifier::IntentClassifier;

/// Markov walk parameters
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub max_words: usize,
    pub randomness_level: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_words: 5,
            randomness_level: 3,
        }
    }
}

/// Shared, read-only collaborators for every conversation
pub struct Collaborators {
    messenger: Arc<dyn Messenger>,
    sentiment: Arc<dyn SentimentClassifier>,
    sentiment_timeout: Duration,
    classifier: Arc<IntentClassifier>,
    generator: Arc<MarkovTextGenerator>,
    generation: GenerationSettings,
}

impl Collaborators {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        sentiment: Arc<dyn SentimentClassifier>,
        sentiment_timeout: Duration,
        classifier: Arc<IntentClassifier>,
        generator: Arc<MarkovTextGenerator>,
        generation: GenerationSettings,
    ) -> Self {
        Self {
            messenger,
            sentiment,
            sentiment_timeout,
            classifier,
            generator,
            generation,
        }
    }

    pub fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.messenger
    }

    pub fn classifier(&self) -> &Arc<IntentClassifier> {
        &self.classifier
    }

    pub fn generator(&self) -> &Arc<MarkovTextGenerator> {
        &self.generator
    }

    /// Sentiment label, or `None` when inconclusive, failed or timed out
    pub async fn sentiment(&self, text: &str) -> Option<Sentiment> {
        match tokio::time::timeout(self.sentiment_timeout, self.sentiment.classify(text)).await {
            Ok(Ok(label)) => label,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Sentiment classification failed");
                None
            }
            Err(_elapsed) => {
                tracing::warn!(
                    timeout_ms = self.sentiment_timeout.as_millis() as u64,
                    "Sentiment classification timed out"
                );
                None
            }
        }
    }

    /// Intent outcome; every failure collapses to `NoMatch`
    pub async fn intent(&self, text: &str, candidates: &[String]) -> IntentOutcome {
        match self.classifier.classify(text, candidates).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "Intent classification failed; treating as no match");
                IntentOutcome::NoMatch
            }
        }
    }

    /// Formatted Markov phrase
    pub fn generate(&self) -> String {
        self.generator
            .generate_formatted(self.generation.max_words, self.generation.randomness_level)
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("messenger", &self.messenger.name())
            .field("sentiment_timeout", &self.sentiment_timeout)
            .field("classifier", &self.classifier)
            .field("generation", &self.generation)
            .finish()
    }
}
