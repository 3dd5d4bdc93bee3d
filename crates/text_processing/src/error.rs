//! Error types for text processing

use std::path::PathBuf;
use thiserror::Error;

/// Text processing errors
#[derive(Error, Debug)]
pub enum TextProcessingError {
    /// Missing or empty corpus, stopword resource or training data
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A candidate label that the corpus does not define
    #[error("Unknown intent: {0}")]
    UnknownIntent(String),

    #[error("Candidate intent list must be nonempty")]
    EmptyCandidateList,

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl TextProcessingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Faults in resources loaded at startup (fatal before serving)
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Io { .. } | Self::Pattern(_))
    }

    /// Per-request caller errors, as opposed to startup configuration faults
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownIntent(_) | Self::EmptyCandidateList | Self::MalformedInput(_)
        )
    }
}

impl From<TextProcessingError> for chat_agent_core::Error {
    fn from(err: TextProcessingError) -> Self {
        match err {
            TextProcessingError::MalformedInput(msg) => chat_agent_core::Error::MalformedInput(msg),
            TextProcessingError::Configuration(msg) => chat_agent_core::Error::Configuration(msg),
            other if other.is_configuration() => {
                chat_agent_core::Error::Configuration(other.to_string())
            }
            other => chat_agent_core::Error::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, TextProcessingError>;
