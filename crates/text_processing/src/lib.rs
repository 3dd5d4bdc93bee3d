//! Text processing for the chat agent
//!
//! This crate provides the decision machinery behind each turn:
//! - **Cleaning**: accent stripping and stopword removal ([`StopwordCleaner`])
//! - **Intent Parsing**: regex fast path plus character n-gram TF-IDF cosine
//!   similarity over a labeled corpus ([`IntentParser`])
//! - **Generation**: Markov chain filler text with bounded randomness
//!   ([`MarkovTextGenerator`])
//! - **Sentiment**: lexicon-based default sentiment collaborator
//!
//! # Example
//!
//! ```
//! use chat_agent_text_processing::{
//!     IntentCorpus, IntentOutcome, IntentParser, ParserConfig, StopwordCleaner, TrainingExample,
//! };
//!
//! let cleaner = StopwordCleaner::from_words(["de", "la"]).unwrap();
//! let corpus = IntentCorpus::build(
//!     vec![
//!         TrainingExample::new("hola buenas", "greeting"),
//!         TrainingExample::new("adios hasta luego", "farewell"),
//!     ],
//!     &cleaner,
//! )
//! .unwrap();
//!
//! let parser = IntentParser::new(corpus, ParserConfig::default());
//! let outcome = parser.intent_parse("hola", &["greeting", "farewell"]).unwrap();
//! assert_eq!(outcome.label(), Some("greeting"));
//! ```

pub mod cleaning;
pub mod generation;
pub mod intent;
pub mod normalize;
pub mod sentiment;

mod error;

pub use error::{Result, TextProcessingError};

pub use cleaning::StopwordCleaner;
pub use generation::{
    format_sentence, MarkovModel, MarkovTextGenerator, Successor, TransitionEntry,
    MAX_TRAINING_TOKENS,
};
pub use intent::{
    load_training_examples, Intent, IntentCorpus, IntentMatch, IntentOutcome, IntentParser,
    MatchMethod, ParserConfig, TrainingExample,
};
pub use normalize::{normalize_query, strip_accents};
pub use sentiment::{SentimentAnalyzer, SentimentConfig};
