//! Chat Agent Server
//!
//! Wires settings, models and collaborators into per-conversation sessions
//! and feeds them from a line-delimited JSON ingress.

pub mod ingress;
pub mod session;
pub mod state;

pub use ingress::{parse_line, serve_lines, IngressStats, ProcessedTurn};
pub use session::{Session, SessionManager};
pub use state::AppState;

use chat_agent_agent::AgentError;
use chat_agent_config::ConfigError;
use chat_agent_text_processing::TextProcessingError;
use chat_agent_transport::TransportError;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A model or collaborator could not be built; fatal at startup
    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Max sessions reached ({0})")]
    CapacityExceeded(usize),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TextProcessingError> for ServerError {
    fn from(err: TextProcessingError) -> Self {
        ServerError::Startup(err.to_string())
    }
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        ServerError::Startup(err.to_string())
    }
}

impl From<TransportError> for ServerError {
    fn from(err: TransportError) -> Self {
        ServerError::Startup(err.to_string())
    }
}
