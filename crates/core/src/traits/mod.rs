//! Collaborator traits for the chat agent
//!
//! The decision machinery talks to the outside world only through these
//! traits, so transports and classifiers can be swapped or mocked.
//!
//! ```text
//! Messaging:
//!   - Messenger: post text (plus optional quick replies) to a conversation
//!
//! Classification:
//!   - SentimentClassifier: text → discrete polarity label
//!
//! Text Processing:
//!   - TextCleaner: accent stripping + stopword removal
//! ```

mod messaging;
mod sentiment;
mod text_processing;

pub use messaging::Messenger;
pub use sentiment::SentimentClassifier;
pub use text_processing::TextCleaner;
