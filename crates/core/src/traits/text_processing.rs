//! Text processing traits

/// Text cleaning interface consumed by the intent corpus builder
///
/// Implementations:
/// - `StopwordCleaner` - accent stripping plus compiled stopword alternation
pub trait TextCleaner: Send + Sync {
    /// Lower-case, strip accents, remove stopwords and collapse whitespace
    fn clean(&self, text: &str) -> String;

    /// Clean every document of a corpus
    fn clean_all(&self, corpus: &[String]) -> Vec<String> {
        corpus.iter().map(|doc| self.clean(doc)).collect()
    }
}
