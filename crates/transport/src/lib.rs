//! Outbound messaging for the chat agent
//!
//! Implementations of [`chat_agent_core::Messenger`]:
//! - [`HttpMessenger`]: posts messages to a Graph-style send API
//! - [`LogMessenger`]: writes messages to the log (no endpoint configured)
//! - [`RetryingMessenger`]: exponential-backoff decorator for either

pub mod http;
pub mod log;
pub mod retry;

pub use http::{HttpMessenger, HttpMessengerConfig};
pub use log::LogMessenger;
pub use retry::{RetryPolicy, RetryingMessenger};

use std::sync::Arc;
use std::time::Duration;

use chat_agent_config::MessagingConfig;
use chat_agent_core::Messenger;
use thiserror::Error;

/// Transport construction errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl From<TransportError> for chat_agent_core::Error {
    fn from(err: TransportError) -> Self {
        chat_agent_core::Error::Configuration(err.to_string())
    }
}

/// Build the messenger described by `config`, wrapped in the retry decorator
///
/// With no endpoint configured, messages are only logged.
pub fn build_messenger(config: &MessagingConfig) -> Result<Arc<dyn Messenger>, TransportError> {
    let inner: Arc<dyn Messenger> = match config.endpoint.as_deref() {
        Some(endpoint) => Arc::new(HttpMessenger::new(HttpMessengerConfig {
            endpoint: endpoint.to_string(),
            access_token: config.access_token.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        })?),
        None => {
            tracing::info!("No messaging endpoint configured, using log-only messenger");
            Arc::new(LogMessenger::new())
        }
    };

    let policy = RetryPolicy {
        max_retries: config.max_retries,
        initial_backoff: Duration::from_millis(config.initial_backoff_ms),
    };
    Ok(Arc::new(RetryingMessenger::new(inner, policy)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_endpoint_logs() {
        let config = MessagingConfig {
            endpoint: None,
            ..MessagingConfig::default()
        };
        let messenger = build_messenger(&config).unwrap();
        assert_eq!(messenger.name(), "retry(log)");
    }

    #[test]
    fn test_build_rejects_bad_endpoint() {
        let config = MessagingConfig {
            endpoint: Some("not a url".to_string()),
            ..MessagingConfig::default()
        };
        assert!(matches!(
            build_messenger(&config),
            Err(TransportError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_build_http_messenger() {
        let config = MessagingConfig {
            endpoint: Some("https://graph.example.com/v2.6/me/messages".to_string()),
            access_token: Some("token".to_string()),
            ..MessagingConfig::default()
        };
        let messenger = build_messenger(&config).unwrap();
        assert_eq!(messenger.name(), "retry(http)");
    }
}
