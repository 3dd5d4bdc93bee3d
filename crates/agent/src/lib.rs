//! Conversation engine for the chat agent
//!
//! Features:
//! - States as data: entry actions plus a transition rule
//! - Pure state composition for branch-then-converge topologies
//! - Reference topology driven by sentiment and intent classification
//! - Off-thread intent classification with a bounded pool and timeout

pub mod classifier;
pub mod collaborators;
pub mod engine;
pub mod graph;
pub mod state;

pub use classifier::IntentClassifier;
pub use collaborators::{Collaborators, GenerationSettings};
pub use engine::{ConversationEngine, SentMessage, TurnReport};
pub use graph::{ids, StateGraph};
pub use state::{compose, Action, ConversationState, Observation, StateId, TransitionRule};

use chat_agent_text_processing::TextProcessingError;
use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    /// Invalid graph or missing model resources; fatal at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller error from the intent parser (unknown label, bad input)
    #[error("Intent error: {0}")]
    Intent(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Timeout")]
    Timeout,
}

impl From<TextProcessingError> for AgentError {
    fn from(err: TextProcessingError) -> Self {
        match err {
            TextProcessingError::Configuration(msg) => AgentError::Configuration(msg),
            other if other.is_configuration() => AgentError::Configuration(other.to_string()),
            other => AgentError::Intent(other.to_string()),
        }
    }
}
