//! Off-thread intent classification
//!
//! `intent_parse` is CPU-bound. Each call takes a permit from a bounded pool,
//! runs on the blocking thread pool and is bounded by a timeout. Waiting for
//! a permit counts against the timeout. The permit travels with the blocking
//! job, so a parse that outlives its caller still occupies a worker.

use std::sync::Arc;
use std::time::Duration;

use chat_agent_text_processing::{IntentOutcome, IntentParser};
use tokio::sync::Semaphore;

use crate::AgentError;

pub struct IntentClassifier {
    parser: Arc<IntentParser>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl IntentClassifier {
    pub fn new(parser: Arc<IntentParser>, workers: usize, timeout: Duration) -> Self {
        Self {
            parser,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            timeout,
        }
    }

    pub fn parser(&self) -> &Arc<IntentParser> {
        &self.parser
    }

    /// Workers not currently running a parse
    pub fn available_workers(&self) -> usize {
        self.permits.available_permits()
    }

    /// Sorted labels of the current corpus
    pub fn labels(&self) -> Result<Vec<String>, AgentError> {
        let corpus = self.parser.corpus()?;
        Ok(corpus.labels().into_iter().map(String::from).collect())
    }

    /// Classify `query` among `candidates`; an empty list means every corpus label
    pub async fn classify(&self, query: &str, candidates: &[String]) -> Result<IntentOutcome, AgentError> {
        let candidates = if candidates.is_empty() {
            self.labels()?
        } else {
            candidates.to_vec()
        };

        let parser = Arc::clone(&self.parser);
        let permits = Arc::clone(&self.permits);
        let query = query.to_string();

        let work = async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|e| AgentError::Classification(format!("worker pool closed: {}", e)))?;
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                parser.intent_parse(&query, &candidates)
            })
                .await
                .map_err(|e| AgentError::Classification(format!("classification task failed: {}", e)))?
                .map_err(AgentError::from)
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_elapsed) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Intent classification timed out"
                );
                Err(AgentError::Timeout)
            }
        }
    }
}

impl std::fmt::Debug for IntentClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentClassifier")
            .field("available_workers", &self.available_workers())
            .field("timeout", &self.timeout)
            .finish()
    }
}
