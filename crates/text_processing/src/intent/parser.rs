//! Two-tier intent parser: regex fast path, then char n-gram cosine similarity

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::corpus::IntentCorpus;
use super::tfidf::{NgramRange, TfidfSpace};
use crate::normalize::{normalize_query, word_count};
use crate::{Result, TextProcessingError};

/// Parser tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Queries with at most this many words try the regex fast path
    pub fast_path_max_words: usize,
    pub ngram_min: usize,
    pub ngram_max: usize,
}

impl ParserConfig {
    fn ngram_range(&self) -> NgramRange {
        NgramRange::new(self.ngram_min, self.ngram_max)
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            fast_path_max_words: 3,
            ngram_min: 2,
            ngram_max: 4,
        }
    }
}

/// Which tier decided a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Regex,
    Cosine,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Regex => "regex",
            MatchMethod::Cosine => "cosine",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentMatch {
    pub label: String,
    /// Relative confidence in [0, 1]
    pub confidence: f32,
    pub method: MatchMethod,
}

/// Result of a classification; `NoMatch` is inconclusive, not an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IntentOutcome {
    Matched(IntentMatch),
    NoMatch,
}

impl IntentOutcome {
    pub fn label(&self) -> Option<&str> {
        match self {
            IntentOutcome::Matched(m) => Some(&m.label),
            IntentOutcome::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, IntentOutcome::Matched(_))
    }
}

impl From<IntentOutcome> for chat_agent_core::ResolvedIntent {
    fn from(outcome: IntentOutcome) -> Self {
        match outcome {
            IntentOutcome::Matched(m) => chat_agent_core::ResolvedIntent::Matched {
                label: m.label,
                confidence: m.confidence,
            },
            IntentOutcome::NoMatch => chat_agent_core::ResolvedIntent::NoMatch,
        }
    }
}

/// Intent parser over a swappable corpus
pub struct IntentParser {
    corpus: RwLock<Option<Arc<IntentCorpus>>>,
    config: ParserConfig,
}

impl IntentParser {
    pub fn new(corpus: IntentCorpus, config: ParserConfig) -> Self {
        Self {
            corpus: RwLock::new(Some(Arc::new(corpus))),
            config,
        }
    }

    /// A parser with no corpus; every call fails until [`reload`](Self::reload)
    pub fn unloaded(config: ParserConfig) -> Self {
        Self {
            corpus: RwLock::new(None),
            config,
        }
    }

    /// Swap in a freshly built corpus; in-flight calls keep the old one
    pub fn reload(&self, corpus: IntentCorpus) {
        let labels = corpus.len();
        *self.corpus.write() = Some(Arc::new(corpus));
        tracing::info!(intents = labels, "Intent corpus reloaded");
    }

    pub fn is_loaded(&self) -> bool {
        self.corpus.read().is_some()
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Snapshot of the current corpus
    pub fn corpus(&self) -> Result<Arc<IntentCorpus>> {
        self.corpus.read().clone().ok_or_else(|| {
            TextProcessingError::Configuration("intent corpus has not been built".to_string())
        })
    }

    /// Classify `query` among `candidates`.
    ///
    /// Short queries try the keyword matchers first; a unique match wins with
    /// confidence 1.0. Otherwise the candidates' canonical texts and the query
    /// are embedded in a fresh TF-IDF space and scored by cosine similarity,
    /// normalised to sum to 1. Ties go to the lexicographically first label.
    pub fn intent_parse<S: AsRef<str>>(&self, query: &str, candidates: &[S]) -> Result<IntentOutcome> {
        let corpus = self.corpus()?;
        let candidates = validate_candidates(&corpus, candidates)?;

        let text = normalize_query(query);
        if text.is_empty() {
            return Err(TextProcessingError::MalformedInput(
                "query has no word characters".to_string(),
            ));
        }

        let words = word_count(query);
        if words <= self.config.fast_path_max_words {
            tracing::debug!(words = words, "Attempting regex parse");
            let matched: Vec<&str> = candidates
                .iter()
                .copied()
                .filter(|label| corpus.get(label).is_some_and(|intent| intent.matches(&text)))
                .collect();

            if let [label] = matched.as_slice() {
                tracing::debug!(label = *label, "Regex parse successful");
                return Ok(IntentOutcome::Matched(IntentMatch {
                    label: label.to_string(),
                    confidence: 1.0,
                    method: MatchMethod::Regex,
                }));
            }
            tracing::debug!(matches = matched.len(), "Regex parse not successful");
        }

        tracing::debug!(candidates = candidates.len(), "Attempting cosine parse");
        if let [label] = candidates.as_slice() {
            let score = single_similarity(&corpus, &text, label, self.config.ngram_range())?;
            return Ok(if score > 0.0 {
                IntentOutcome::Matched(IntentMatch {
                    label: label.to_string(),
                    confidence: score,
                    method: MatchMethod::Cosine,
                })
            } else {
                IntentOutcome::NoMatch
            });
        }

        Ok(cosine_parse(&corpus, &text, &candidates, self.config.ngram_range()))
    }

    /// Cosine similarity between `query` and one label's canonical text,
    /// computed in a two-document TF-IDF space
    pub fn cosine_single_comparison(&self, query: &str, label: &str) -> Result<f32> {
        let corpus = self.corpus()?;
        let text = normalize_query(query);
        if text.is_empty() {
            return Err(TextProcessingError::MalformedInput(
                "query has no word characters".to_string(),
            ));
        }
        single_similarity(&corpus, &text, label, self.config.ngram_range())
    }
}

impl std::fmt::Debug for IntentParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentParser")
            .field("loaded", &self.is_loaded())
            .field("config", &self.config)
            .finish()
    }
}

/// Dedupe and sort the candidate labels, checking each against the corpus
fn validate_candidates<'a, S: AsRef<str>>(
    corpus: &IntentCorpus,
    candidates: &'a [S],
) -> Result<Vec<&'a str>> {
    if candidates.is_empty() {
        return Err(TextProcessingError::EmptyCandidateList);
    }

    let unique: BTreeSet<&str> = candidates.iter().map(|c| c.as_ref()).collect();
    for label in &unique {
        if !corpus.contains(label) {
            return Err(TextProcessingError::UnknownIntent(label.to_string()));
        }
    }
    Ok(unique.into_iter().collect())
}

fn single_similarity(
    corpus: &IntentCorpus,
    normalized_query: &str,
    label: &str,
    range: NgramRange,
) -> Result<f32> {
    let intent = corpus
        .get(label)
        .ok_or_else(|| TextProcessingError::UnknownIntent(label.to_string()))?;
    let space = TfidfSpace::fit(&[intent.canonical_text(), normalized_query], range);
    Ok(space.similarity(0, 1) as f32)
}

/// `candidates` must be sorted; the first label wins ties
fn cosine_parse(
    corpus: &IntentCorpus,
    normalized_query: &str,
    candidates: &[&str],
    range: NgramRange,
) -> IntentOutcome {
    let mut documents: Vec<&str> = candidates
        .iter()
        .filter_map(|label| corpus.get(label).map(|intent| intent.canonical_text()))
        .collect();
    documents.push(normalized_query);

    let space = TfidfSpace::fit(&documents, range);
    let query_index = documents.len() - 1;
    let scores: Vec<f64> = (0..query_index)
        .map(|i| space.similarity(query_index, i))
        .collect();

    let total: f64 = scores.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        tracing::debug!("No n-gram overlap with any candidate");
        return IntentOutcome::NoMatch;
    }

    let mut best = 0;
    for (i, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[best] {
            best = i;
        }
    }

    let confidence = (scores[best] / total).clamp(0.0, 1.0) as f32;
    tracing::debug!(
        label = candidates[best],
        confidence = confidence,
        "Cosine parse decided"
    );

    IntentOutcome::Matched(IntentMatch {
        label: candidates[best].to_string(),
        confidence,
        method: MatchMethod::Cosine,
    })
}
