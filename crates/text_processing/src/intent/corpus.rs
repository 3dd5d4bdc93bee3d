//! Intent corpus: per-label canonical text and keyword matcher

use std::collections::BTreeMap;

use chat_agent_core::TextCleaner;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::normalize::normalize_query;
use crate::{Result, TextProcessingError};

/// One labeled training document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub text: String,
    pub label: String,
}

impl TrainingExample {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// A built intent
#[derive(Debug, Clone)]
pub struct Intent {
    label: String,
    canonical_text: String,
    matcher: Regex,
    keywords: Vec<String>,
}

impl Intent {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Cleaned examples joined by single spaces
    pub fn canonical_text(&self) -> &str {
        &self.canonical_text
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Whether any keyword occurs as a whole word in an already-normalised query
    pub fn matches(&self, normalized_query: &str) -> bool {
        self.matcher.is_match(normalized_query)
    }
}

/// Immutable set of intents, keyed by label
///
/// Rebuilding means constructing a new corpus; there is no in-place mutation.
#[derive(Debug, Clone)]
pub struct IntentCorpus {
    intents: BTreeMap<String, Intent>,
}

impl IntentCorpus {
    /// Group examples by label and build one [`Intent`] per label
    pub fn build<I>(examples: I, cleaner: &dyn TextCleaner) -> Result<Self>
    where
        I: IntoIterator<Item = TrainingExample>,
    {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for example in examples {
            let label = example.label.trim();
            if label.is_empty() {
                return Err(TextProcessingError::Configuration(format!(
                    "training example without label: {:?}",
                    example.text
                )));
            }
            grouped
                .entry(label.to_string())
                .or_default()
                .push(example.text);
        }

        if grouped.is_empty() {
            return Err(TextProcessingError::Configuration(
                "intent corpus is empty".to_string(),
            ));
        }

        let mut intents = BTreeMap::new();
        for (label, documents) in grouped {
            let intent = Self::build_intent(&label, &documents, cleaner)?;
            intents.insert(label, intent);
        }

        tracing::info!(intents = intents.len(), "Built intent corpus");
        Ok(Self { intents })
    }

    /// Build from a `label -> documents` mapping
    pub fn from_mapping<I, D>(mapping: I, cleaner: &dyn TextCleaner) -> Result<Self>
    where
        I: IntoIterator<Item = (String, D)>,
        D: IntoIterator<Item = String>,
    {
        let examples = mapping.into_iter().flat_map(|(label, docs)| {
            docs.into_iter()
                .map(move |text| TrainingExample::new(text, label.clone()))
        });
        Self::build(examples, cleaner)
    }

    fn build_intent(label: &str, documents: &[String], cleaner: &dyn TextCleaner) -> Result<Intent> {
        let documents: Vec<&String> = documents.iter().filter(|d| !d.trim().is_empty()).collect();
        if documents.is_empty() {
            return Err(TextProcessingError::Configuration(format!(
                "intent '{}' has no non-empty examples",
                label
            )));
        }

        let canonical_text = documents
            .iter()
            .map(|doc| cleaner.clean(doc))
            .filter(|cleaned| !cleaned.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if canonical_text.is_empty() {
            tracing::warn!(label = label, "Intent examples are made of stopwords only");
        }

        let mut keywords: Vec<String> = Vec::new();
        for doc in &documents {
            for token in normalize_query(doc).split(' ') {
                if !token.is_empty() && !keywords.iter().any(|k| k == token) {
                    keywords.push(token.to_string());
                }
            }
        }
        if keywords.is_empty() {
            return Err(TextProcessingError::Configuration(format!(
                "intent '{}' has no keyword tokens",
                label
            )));
        }

        let alternation = keywords
            .iter()
            .map(|k| format!(r"(\b{}\b)", regex::escape(k)))
            .collect::<Vec<_>>()
            .join("|");
        let matcher = Regex::new(&alternation)?;

        tracing::debug!(
            label = label,
            examples = documents.len(),
            keywords = keywords.len(),
            "Built intent"
        );

        Ok(Intent {
            label: label.to_string(),
            canonical_text,
            matcher,
            keywords,
        })
    }

    pub fn get(&self, label: &str) -> Option<&Intent> {
        self.intents.get(label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.intents.contains_key(label)
    }

    /// Labels in lexicographic order
    pub fn labels(&self) -> Vec<&str> {
        self.intents.keys().map(|k| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Intent> {
        self.intents.values()
    }
}
