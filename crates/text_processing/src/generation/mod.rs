//! Markov text generation
//!
//! Trained once at startup, then shared read-only across conversations.

mod formatter;
mod markov;
mod tokenizer;

pub use formatter::{format_sentence, try_format};
pub use markov::{MarkovModel, MarkovTextGenerator, Successor, TransitionEntry, MAX_TRAINING_TOKENS};
pub use tokenizer::{prepare_corpus, tokenize};
