//! Markov chain text generator
//!
//! Transition weights are `count / (tokens + 1) * 1 / distinct_successors`,
//! where the `+ 1` accounts for the end-of-sequence marker that follows the
//! final token. They are NOT a probability distribution over a state's
//! successors; the walk only uses their rank.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::formatter::format_sentence;
use super::tokenizer::{prepare_corpus, tokenize};
use crate::{Result, TextProcessingError};

/// Hard cap on training tokens
pub const MAX_TRAINING_TOKENS: usize = 100_000;

/// What follows a token in the training sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Successor {
    Token(String),
    EndOfSequence,
}

impl Successor {
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Successor::Token(t) => Some(t),
            Successor::EndOfSequence => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEntry {
    pub to: Successor,
    pub count: usize,
    pub weight: f64,
}

/// Trained transition table
#[derive(Debug, Clone)]
pub struct MarkovModel {
    /// Successors per state, sorted by weight descending
    transitions: HashMap<String, Vec<TransitionEntry>>,
    /// Distinct states, sorted
    states: Vec<String>,
    total_tokens: usize,
}

impl MarkovModel {
    /// Train on `tokens`, truncated to `cap`
    pub fn train<I, S>(tokens: I, cap: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().take(cap).map(Into::into).collect();
        if tokens.is_empty() {
            return Err(TextProcessingError::Configuration(
                "Markov training data is empty".to_string(),
            ));
        }

        let mut counts: HashMap<&str, HashMap<Successor, usize>> = HashMap::new();
        for (i, token) in tokens.iter().enumerate() {
            let next = match tokens.get(i + 1) {
                Some(next) => Successor::Token(next.clone()),
                None => Successor::EndOfSequence,
            };
            *counts.entry(token.as_str()).or_default().entry(next).or_insert(0) += 1;
        }

        let denominator = (tokens.len() + 1) as f64;
        let transitions: HashMap<String, Vec<TransitionEntry>> = counts
            .into_iter()
            .map(|(state, successors)| {
                let distinct = successors.len() as f64;
                let mut entries: Vec<TransitionEntry> = successors
                    .into_iter()
                    .map(|(to, count)| TransitionEntry {
                        weight: (count as f64 / denominator) * (1.0 / distinct),
                        to,
                        count,
                    })
                    .collect();
                entries.sort_by(|a, b| b.weight.total_cmp(&a.weight).then_with(|| a.to.cmp(&b.to)));
                (state.to_string(), entries)
            })
            .collect();

        let states: Vec<String> = tokens
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect();

        tracing::info!(
            tokens = tokens.len(),
            states = states.len(),
            "Trained Markov model"
        );

        Ok(Self {
            transitions,
            states,
            total_tokens: tokens.len(),
        })
    }

    /// Distinct tokens, sorted
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Tokens used for training after truncation
    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    /// Successors of `state`, heaviest first
    pub fn successors(&self, state: &str) -> &[TransitionEntry] {
        self.transitions.get(state).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Times `to` immediately followed `from`
    pub fn count(&self, from: &str, to: &Successor) -> usize {
        self.successors(from)
            .iter()
            .find(|e| &e.to == to)
            .map(|e| e.count)
            .unwrap_or(0)
    }
}

/// Number of leading successors spanned by the first `runs` groups of equal weight
fn candidate_prefix(entries: &[TransitionEntry], runs: usize) -> usize {
    let mut seen_runs = 0;
    let mut len = 0;
    let mut last: Option<f64> = None;
    for entry in entries {
        if last != Some(entry.weight) {
            if seen_runs == runs {
                break;
            }
            seen_runs += 1;
            last = Some(entry.weight);
        }
        len += 1;
    }
    len
}

/// Generator over an immutable model; safe to share across threads
#[derive(Debug, Clone)]
pub struct MarkovTextGenerator {
    model: MarkovModel,
}

impl MarkovTextGenerator {
    pub fn new(model: MarkovModel) -> Self {
        Self { model }
    }

    /// Prepare, tokenise and train on raw text
    pub fn from_text(text: &str, cap: usize) -> Result<Self> {
        let tokens = tokenize(&prepare_corpus(text));
        Ok(Self::new(MarkovModel::train(tokens, cap)?))
    }

    /// Train on the concatenation of `paths`, in order
    pub fn from_files<P: AsRef<Path>>(paths: &[P], cap: usize) -> Result<Self> {
        if paths.is_empty() {
            return Err(TextProcessingError::Configuration(
                "no Markov training files configured".to_string(),
            ));
        }

        let mut text = String::new();
        for path in paths {
            let path = path.as_ref();
            tracing::debug!(path = %path.display(), "Reading Markov training file");
            let content =
                std::fs::read_to_string(path).map_err(|e| TextProcessingError::io(path, e))?;
            text.push(' ');
            text.push_str(&content);
        }

        Self::from_text(&text, cap)
    }

    pub fn model(&self) -> &MarkovModel {
        &self.model
    }

    /// Generate with the thread-local RNG
    pub fn generate(&self, max_words: usize, randomness_level: usize) -> String {
        self.generate_with_rng(&mut rand::thread_rng(), max_words, randomness_level)
    }

    /// Walk from a uniformly chosen state and join the tokens with spaces
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        max_words: usize,
        randomness_level: usize,
    ) -> String {
        if max_words == 0 {
            return String::new();
        }
        match self.model.states().choose(rng) {
            Some(seed) => self.walk(rng, seed, max_words, randomness_level).join(" "),
            None => String::new(),
        }
    }

    /// Walk from `seed`, emitting at most `max_words` tokens including the seed.
    ///
    /// At each step the successors are grouped into runs of equal weight and
    /// the next token is drawn uniformly from the first `randomness_level`
    /// runs. Drawing the end-of-sequence marker stops the walk.
    pub fn walk<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        seed: &str,
        max_words: usize,
        randomness_level: usize,
    ) -> Vec<String> {
        if max_words == 0 {
            return Vec::new();
        }
        let runs = randomness_level.max(1);

        let mut story = vec![seed.to_string()];
        let mut current = seed.to_string();
        for _ in 1..max_words {
            let successors = self.model.successors(&current);
            let prefix = candidate_prefix(successors, runs);
            let Some(choice) = successors[..prefix].choose(rng) else {
                break;
            };
            match &choice.to {
                Successor::Token(next) => {
                    story.push(next.clone());
                    current = next.clone();
                }
                Successor::EndOfSequence => break,
            }
        }
        story
    }

    /// [`generate`](Self::generate) followed by sentence formatting
    pub fn generate_formatted(&self, max_words: usize, randomness_level: usize) -> String {
        format_sentence(&self.generate(max_words, randomness_level))
    }

    pub fn generate_formatted_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        max_words: usize,
        randomness_level: usize,
    ) -> String {
        format_sentence(&self.generate_with_rng(rng, max_words, randomness_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_weights_are_not_normalised() {
        // a b a c a <EOS>
        let model = MarkovModel::train(tokens("a b a c a"), MAX_TRAINING_TOKENS).unwrap();
        let successors = model.successors("a");
        assert_eq!(successors.len(), 3);

        let expected = (1.0 / 6.0) * (1.0 / 3.0);
        for entry in successors {
            assert_eq!(entry.count, 1);
            assert!((entry.weight - expected).abs() < 1e-12);
        }
        assert!((expected - 0.0556).abs() < 1e-4);
        let total: f64 = successors.iter().map(|e| e.weight).sum();
        assert!(total < 1.0);
        assert_eq!(model.count("a", &Successor::EndOfSequence), 1);
    }

    #[test]
    fn test_counts_match_sequence() {
        let seq = tokens("el gato y el perro y el gato .");
        let model = MarkovModel::train(seq.clone(), MAX_TRAINING_TOKENS).unwrap();

        for (i, from) in seq.iter().enumerate() {
            let to = match seq.get(i + 1) {
                Some(t) => Successor::Token(t.clone()),
                None => Successor::EndOfSequence,
            };
            let expected = seq
                .windows(2)
                .filter(|w| &w[0] == from && Some(w[1].as_str()) == to.as_token())
                .count()
                + usize::from(to == Successor::EndOfSequence);
            assert_eq!(model.count(from, &to), expected);
        }
        assert_eq!(model.count("el", &Successor::Token("gato".into())), 2);
        // heaviest first
        assert_eq!(model.successors("el")[0].to, Successor::Token("gato".into()));
    }

    #[test]
    fn test_training_is_capped() {
        let model = MarkovModel::train(tokens("a b c d e"), 3).unwrap();
        assert_eq!(model.total_tokens(), 3);
        assert_eq!(model.states(), &["a", "b", "c"]);
        assert_eq!(model.count("c", &Successor::EndOfSequence), 1);
        assert!(model.successors("d").is_empty());
    }

    #[test]
    fn test_empty_training_data_is_rejected() {
        assert!(matches!(
            MarkovModel::train(Vec::<String>::new(), 10),
            Err(TextProcessingError::Configuration(_))
        ));
        assert!(MarkovTextGenerator::from_text("¿¡ 😀", 10).is_err());
    }

    #[test]
    fn test_candidate_prefix_groups_equal_weights() {
        let entry = |w: f64| TransitionEntry {
            to: Successor::EndOfSequence,
            count: 1,
            weight: w,
        };
        let entries = vec![entry(0.5), entry(0.5), entry(0.2), entry(0.1), entry(0.1)];
        assert_eq!(candidate_prefix(&entries, 1), 2);
        assert_eq!(candidate_prefix(&entries, 2), 3);
        assert_eq!(candidate_prefix(&entries, 3), 5);
        assert_eq!(candidate_prefix(&entries, 10), 5);
        assert_eq!(candidate_prefix(&[], 3), 0);
    }

    #[test]
    fn test_lowest_randomness_follows_heaviest_successor() {
        // "a" is followed by "b" twice and "c" once
        let model = MarkovModel::train(tokens("a b a b a c"), MAX_TRAINING_TOKENS).unwrap();
        let generator = MarkovTextGenerator::new(model);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(generator.walk(&mut rng, "a", 2, 1), vec!["a", "b"]);
        }
    }

    #[test]
    fn test_generated_tokens_are_known_states() {
        let generator = MarkovTextGenerator::from_text(
            "Hola amigo, buenos días. Qué gusto verte, amigo. Buenas tardes a todos.",
            MAX_TRAINING_TOKENS,
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let text = generator.generate_with_rng(&mut rng, 6, 3);
            let words: Vec<&str> = text.split(' ').collect();
            assert!(!words.is_empty() && words.len() <= 6);
            for word in words {
                assert!(generator.model().states().iter().any(|s| s == word));
            }
        }
    }

    #[test]
    fn test_walk_stops_at_end_of_sequence() {
        let generator = MarkovTextGenerator::new(
            MarkovModel::train(tokens("hola amigo ."), MAX_TRAINING_TOKENS).unwrap(),
        );
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(generator.walk(&mut rng, "hola", 10, 3), vec!["hola", "amigo", "."]);
        assert_eq!(generator.walk(&mut rng, "amigo", 2, 3), vec!["amigo", "."]);
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let generator =
            MarkovTextGenerator::from_text("uno dos tres uno tres dos uno .", 100).unwrap();
        let a = generator.generate_with_rng(&mut StdRng::seed_from_u64(9), 5, 2);
        let b = generator.generate_with_rng(&mut StdRng::seed_from_u64(9), 5, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_max_words_and_randomness() {
        let generator = MarkovTextGenerator::from_text("hola amigo .", 100).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(generator.generate_with_rng(&mut rng, 0, 3), "");
        // randomness 0 behaves like 1
        assert_eq!(generator.walk(&mut rng, "hola", 3, 0), vec!["hola", "amigo", "."]);
    }

    #[test]
    fn test_formatted_generation_from_single_sentence() {
        let generator = MarkovTextGenerator::from_text("hola amigo .", 100).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10 {
            let text = generator.generate_formatted_with_rng(&mut rng, 5, 3);
            // every walk ends on the period, whichever state it starts from
            assert!(["Hola amigo.", "Amigo.", "."].contains(&text.as_str()), "{}", text);
        }
    }

    #[test]
    fn test_from_files_concatenates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.txt");
        let second = dir.path().join("b.txt");
        std::fs::write(&first, "hola amigo").unwrap();
        std::fs::write(&second, "adios amiga").unwrap();

        let generator = MarkovTextGenerator::from_files(&[&first, &second], 100).unwrap();
        assert_eq!(
            generator.model().count("amigo", &Successor::Token("adios".into())),
            1
        );
        assert!(matches!(
            MarkovTextGenerator::from_files(&[dir.path().join("missing.txt")], 100),
            Err(TextProcessingError::Io { .. })
        ));
    }
}
