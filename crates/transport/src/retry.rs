//! Retry decorator for messengers
//!
//! Transient failures ([`MessagingError::is_retryable`]) are retried with
//! exponential backoff; rejections are returned immediately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chat_agent_core::{Messenger, MessagingError, OutgoingMessage};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

pub struct RetryingMessenger {
    inner: Arc<dyn Messenger>,
    policy: RetryPolicy,
    name: String,
}

impl RetryingMessenger {
    pub fn new(inner: Arc<dyn Messenger>, policy: RetryPolicy) -> Self {
        let name = format!("retry({})", inner.name());
        Self {
            inner,
            policy,
            name,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl Messenger for RetryingMessenger {
    async fn send(
        &self,
        conversation_id: &str,
        message: &OutgoingMessage,
    ) -> Result<(), MessagingError> {
        let mut last_error = None;
        let mut backoff = self.policy.initial_backoff;

        for attempt in 0..=self.policy.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    conversation_id,
                    attempt,
                    max_retries = self.policy.max_retries,
                    "Message send failed, retrying in {:?}",
                    backoff
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.inner.send(conversation_id, message).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() => {
                    last_error = Some(e);
                }
                Err(e) => {
                    tracing::warn!(conversation_id, error = %e, "Message rejected");
                    return Err(e);
                }
            }
        }

        let error = last_error
            .unwrap_or_else(|| MessagingError::Transport("Max retries exceeded".to_string()));
        tracing::warn!(
            conversation_id,
            attempts = self.policy.max_retries + 1,
            error = %error,
            "Message send failed after final retry"
        );
        Err(error)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Returns scripted results in order, then succeeds
    struct ScriptedMessenger {
        results: Mutex<VecDeque<Result<(), MessagingError>>>,
        calls: AtomicU32,
    }

    impl ScriptedMessenger {
        fn new(results: Vec<Result<(), MessagingError>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Messenger for ScriptedMessenger {
        async fn send(&self, _: &str, _: &OutgoingMessage) -> Result<(), MessagingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results.lock().pop_front().unwrap_or(Ok(()))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let inner = ScriptedMessenger::new(vec![
            Err(MessagingError::Transport("reset".into())),
            Err(MessagingError::Remote {
                status: 502,
                body: String::new(),
            }),
        ]);
        let messenger = RetryingMessenger::new(inner.clone(), policy(3));

        messenger
            .send("1", &OutgoingMessage::text("hola"))
            .await
            .unwrap();
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let inner = ScriptedMessenger::new(vec![Err(MessagingError::Rejected {
            status: 400,
            body: "bad recipient".into(),
        })]);
        let messenger = RetryingMessenger::new(inner.clone(), policy(3));

        let err = messenger
            .send("1", &OutgoingMessage::text("hola"))
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::Rejected { status: 400, .. }));
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let inner = ScriptedMessenger::new(vec![
            Err(MessagingError::Timeout),
            Err(MessagingError::Timeout),
            Err(MessagingError::Timeout),
        ]);
        let messenger = RetryingMessenger::new(inner.clone(), policy(2));

        let err = messenger
            .send("1", &OutgoingMessage::text("hola"))
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::Timeout));
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_sends_once() {
        let inner = ScriptedMessenger::new(vec![Err(MessagingError::Timeout)]);
        let messenger = RetryingMessenger::new(inner.clone(), policy(0));

        assert!(messenger
            .send("1", &OutgoingMessage::text("hola"))
            .await
            .is_err());
        assert_eq!(inner.calls(), 1);
    }

    #[test]
    fn test_name_wraps_inner() {
        let inner = ScriptedMessenger::new(Vec::new());
        let messenger = RetryingMessenger::new(inner, RetryPolicy::default());
        assert_eq!(messenger.name(), "retry(scripted)");
    }
}
