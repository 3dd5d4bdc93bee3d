//! Outbound messaging trait

use async_trait::async_trait;

use crate::{MessagingError, OutgoingMessage};

/// Outbound messaging interface
///
/// Implementations:
/// - `HttpMessenger` - posts to a messaging platform send API
/// - `LogMessenger` - writes messages to the log only
/// - `RetryingMessenger` - retry/backoff decorator over any messenger
#[async_trait]
pub trait Messenger: Send + Sync + 'static {
    /// Deliver a message to the given conversation
    async fn send(
        &self,
        conversation_id: &str,
        message: &OutgoingMessage,
    ) -> Result<(), MessagingError>;

    /// Transport name for logging
    fn name(&self) -> &str;
}
