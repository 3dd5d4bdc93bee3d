//! Stopword-based text cleaner
//!
//! Default implementation of the [`TextCleaner`] collaborator: lower-cases,
//! strips accents, removes stopwords through one compiled alternation and
//! collapses whitespace.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use chat_agent_core::TextCleaner;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::{squash_whitespace, strip_accents};
use crate::{Result, TextProcessingError};

static STARTS_WITH_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w").unwrap());

/// Cleaner that removes a configured list of stopwords
#[derive(Debug)]
pub struct StopwordCleaner {
    stopwords: Vec<String>,
    /// `None` when the list is empty (normalisation only)
    pattern: Option<Regex>,
    warned_empty: AtomicBool,
}

impl StopwordCleaner {
    /// Load a newline-delimited stopword list
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| TextProcessingError::io(path, e))?;

        let cleaner = Self::from_words(content.lines())?;
        tracing::info!(
            path = %path.display(),
            stopwords = cleaner.len(),
            "Loaded stopword list"
        );
        Ok(cleaner)
    }

    /// Build from an in-memory list; blank entries are ignored
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stopwords: Vec<String> = Vec::new();
        for word in words {
            let word = strip_accents(&word.as_ref().trim().to_lowercase());
            if !word.is_empty() && !stopwords.contains(&word) {
                stopwords.push(word);
            }
        }

        let pattern = if stopwords.is_empty() {
            tracing::warn!("No stopword detected; cleaner will only normalise text");
            None
        } else {
            let alternation = stopwords
                .iter()
                .map(|w| {
                    if STARTS_WITH_WORD.is_match(w) {
                        format!(r"(\b{}\b)", regex::escape(w))
                    } else {
                        format!("({})", regex::escape(w))
                    }
                })
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&alternation)?)
        };

        Ok(Self {
            stopwords,
            pattern,
            warned_empty: AtomicBool::new(false),
        })
    }

    /// A cleaner with no stopwords
    pub fn empty() -> Self {
        Self {
            stopwords: Vec::new(),
            pattern: None,
            warned_empty: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.stopwords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stopwords.is_empty()
    }

    pub fn stopwords(&self) -> &[String] {
        &self.stopwords
    }
}

impl TextCleaner for StopwordCleaner {
    fn clean(&self, text: &str) -> String {
        let lowered = strip_accents(&text.to_lowercase());
        let removed = match &self.pattern {
            Some(pattern) => pattern.replace_all(&lowered, "").into_owned(),
            None => {
                if !self.warned_empty.swap(true, Ordering::Relaxed) {
                    tracing::warn!("No stopword detected; skipping stopword removal");
                }
                lowered
            }
        };
        squash_whitespace(&removed).trim().to_string()
    }
}
