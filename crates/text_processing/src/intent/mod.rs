//! Intent classification
//!
//! - [`IntentCorpus`]: per-label canonical text and whole-word keyword matcher
//! - [`IntentParser`]: regex fast path for short queries, then character
//!   n-gram TF-IDF cosine similarity over the candidate labels
//! - [`load_training_examples`]: YAML / JSON / two-column training data

mod corpus;
mod loader;
mod parser;
pub mod tfidf;

pub use corpus::{Intent, IntentCorpus, TrainingExample};
pub use loader::{load_training_examples, parse_two_column};
pub use parser::{IntentMatch, IntentOutcome, IntentParser, MatchMethod, ParserConfig};
