//! Log-only messenger
//!
//! Used when no send endpoint is configured: every message is written to the
//! `tracing` log and counted, and delivery always succeeds.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chat_agent_core::{Messenger, MessagingError, OutgoingMessage};

#[derive(Debug, Default)]
pub struct LogMessenger {
    sent: AtomicU64,
}

impl LogMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages written so far
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Messenger for LogMessenger {
    async fn send(
        &self,
        conversation_id: &str,
        message: &OutgoingMessage,
    ) -> Result<(), MessagingError> {
        let replies: Vec<&str> = message
            .quick_replies
            .iter()
            .map(|reply| reply.title.as_str())
            .collect();
        tracing::info!(
            conversation_id,
            text = %message.text,
            quick_replies = ?replies,
            "Outgoing message"
        );
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_agent_core::QuickReply;

    #[tokio::test]
    async fn test_log_messenger_counts() {
        let messenger = LogMessenger::new();
        messenger
            .send("1", &OutgoingMessage::text("hola"))
            .await
            .unwrap();
        messenger
            .send(
                "1",
                &OutgoingMessage::text("¿Cómo te sientes hoy?")
                    .with_quick_replies(vec![QuickReply::text("😀", "bien")]),
            )
            .await
            .unwrap();
        assert_eq!(messenger.sent(), 2);
    }
}
