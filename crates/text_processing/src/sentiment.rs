//! Lexicon sentiment analyzer
//!
//! Default [`SentimentClassifier`]: counts positive and negative lexicon hits.
//! Word entries match whole words of the normalised text; entries without
//! word characters (emoji) match the raw text literally.

use async_trait::async_trait;
use chat_agent_core::{Sentiment, SentimentClassifier, SentimentError};
use regex::Regex;

use crate::normalize::normalize_query;
use crate::Result;

#[derive(Debug, Clone)]
pub struct SentimentConfig {
    pub positive_words: Vec<String>,
    pub negative_words: Vec<String>,
}

#[derive(Debug, Clone)]
struct Lexicon {
    words: Option<Regex>,
    symbols: Vec<String>,
}

impl Lexicon {
    fn build(entries: &[String]) -> Result<Self> {
        let mut words = Vec::new();
        let mut symbols = Vec::new();
        for entry in entries {
            let normalized = normalize_query(entry);
            if !normalized.is_empty() {
                words.push(format!(r"\b{}\b", regex::escape(&normalized)));
            } else if !entry.trim().is_empty() {
                symbols.push(entry.trim().to_string());
            }
        }

        let words = if words.is_empty() {
            None
        } else {
            Some(Regex::new(&words.join("|"))?)
        };
        Ok(Self { words, symbols })
    }

    fn hits(&self, raw: &str, normalized: &str) -> usize {
        let word_hits = self
            .words
            .as_ref()
            .map(|re| re.find_iter(normalized).count())
            .unwrap_or(0);
        let symbol_hits: usize = self.symbols.iter().map(|s| raw.matches(s.as_str()).count()).sum();
        word_hits + symbol_hits
    }
}

/// Keyword-count sentiment classifier
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    positive: Lexicon,
    negative: Lexicon,
}

impl SentimentAnalyzer {
    pub fn new(config: SentimentConfig) -> Result<Self> {
        Ok(Self {
            positive: Lexicon::build(&config.positive_words)?,
            negative: Lexicon::build(&config.negative_words)?,
        })
    }

    /// Positive hits minus negative hits
    pub fn score(&self, text: &str) -> i64 {
        let normalized = normalize_query(text);
        self.positive.hits(text, &normalized) as i64 - self.negative.hits(text, &normalized) as i64
    }

    pub fn analyze(&self, text: &str) -> Option<Sentiment> {
        match self.score(text) {
            s if s > 0 => Some(Sentiment::Positive),
            s if s < 0 => Some(Sentiment::Negative),
            _ => None,
        }
    }
}

#[async_trait]
impl SentimentClassifier for SentimentAnalyzer {
    async fn classify(&self, text: &str) -> std::result::Result<Option<Sentiment>, SentimentError> {
        let sentiment = self.analyze(text);
        tracing::debug!(sentiment = ?sentiment, "Lexicon sentiment");
        Ok(sentiment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> SentimentAnalyzer {
        SentimentAnalyzer::new(SentimentConfig {
            positive_words: vec!["bien".into(), "muy bien".into(), "genial".into(), "😀".into()],
            negative_words: vec!["mal".into(), "triste".into(), "😞".into()],
        })
        .unwrap()
    }

    #[test]
    fn test_positive_and_negative() {
        let analyzer = analyzer();
        assert_eq!(analyzer.analyze("Me siento muy bien"), Some(Sentiment::Positive));
        assert_eq!(analyzer.analyze("estoy triste y mal"), Some(Sentiment::Negative));
        assert_eq!(analyzer.analyze("😞"), Some(Sentiment::Negative));
        assert_eq!(analyzer.analyze("😀😀 mal"), Some(Sentiment::Positive));
    }

    #[test]
    fn test_neutral_is_none() {
        let analyzer = analyzer();
        assert_eq!(analyzer.analyze("el clima de hoy"), None);
        assert_eq!(analyzer.analyze("bien mal"), None);
        // whole words only
        assert_eq!(analyzer.analyze("malvavisco"), None);
    }

    #[tokio::test]
    async fn test_classifier_trait() {
        let analyzer = analyzer();
        let result = analyzer.classify("¡Genial!").await.unwrap();
        assert_eq!(result, Some(Sentiment::Positive));
    }
}
