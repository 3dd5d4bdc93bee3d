//! Sentiment classification trait

use async_trait::async_trait;

use crate::{Sentiment, SentimentError};

/// Opaque sentiment capability
///
/// Returns `Ok(None)` when the classifier has no opinion about the text.
///
/// # Example
///
/// ```ignore
/// let classifier: Arc<dyn SentimentClassifier> = Arc::new(SentimentAnalyzer::default());
/// match classifier.classify("me siento genial").await? {
///     Some(Sentiment::Positive) => { /* ... */ }
///     _ => { /* ... */ }
/// }
/// ```
#[async_trait]
pub trait SentimentClassifier: Send + Sync + 'static {
    async fn classify(&self, text: &str) -> Result<Option<Sentiment>, SentimentError>;
}
