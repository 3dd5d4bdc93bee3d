//! Error types shared across crates

use thiserror::Error;

/// Errors raised by an outbound messaging transport
#[derive(Error, Debug, Clone)]
pub enum MessagingError {
    /// Network-level failure; worth retrying
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote end refused the message; retrying will not help
    #[error("Message rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Remote end failed with a server error; worth retrying
    #[error("Remote error {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Send timed out")]
    Timeout,
}

impl MessagingError {
    /// Whether a retry could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MessagingError::Transport(_) | MessagingError::Remote { .. } | MessagingError::Timeout
        )
    }
}

/// Errors raised by a sentiment classifier
#[derive(Error, Debug, Clone)]
pub enum SentimentError {
    #[error("Sentiment classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Sentiment classification timed out")]
    Timeout,
}

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error(transparent)]
    Sentiment(#[from] SentimentError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_messaging_errors() {
        assert!(MessagingError::Transport("reset".into()).is_retryable());
        assert!(MessagingError::Timeout.is_retryable());
        assert!(MessagingError::Remote {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!MessagingError::Rejected {
            status: 400,
            body: "bad recipient".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = MessagingError::Timeout.into();
        assert!(matches!(err, Error::Messaging(MessagingError::Timeout)));
        assert_eq!(err.to_string(), "Send timed out");
    }
}
