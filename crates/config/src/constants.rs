//! Centralized constants for the chat agent
//!
//! Single source of truth for default values used across crates. Settings
//! defaults and library defaults both read from here.

/// Intent classification defaults
pub mod intent {
    /// Queries with at most this many words try the keyword regex first
    pub const FAST_PATH_MAX_WORDS: usize = 3;

    /// Character n-gram range used by the TF-IDF similarity path
    pub const NGRAM_MIN: usize = 2;
    pub const NGRAM_MAX: usize = 4;

    /// Upper bound on a single classification (ms)
    pub const TIMEOUT_MS: u64 = 2_000;

    /// Concurrent classifications allowed on the blocking pool
    pub const WORKERS: usize = 4;

    pub const CORPUS_PATH: &str = "data/intents.yaml";
    pub const STOPWORDS_PATH: &str = "data/stopwords-es.txt";
}

/// Markov text generator defaults
pub mod generator {
    /// Hard cap on training tokens
    pub const MAX_TRAINING_TOKENS: usize = 100_000;

    /// Words per generated phrase
    pub const MAX_WORDS: usize = 5;

    /// Number of equal-weight successor groups sampled from
    pub const RANDOMNESS_LEVEL: usize = 3;

    pub const CORPUS_PATH: &str = "data/saludos.txt";
}

/// Sentiment collaborator defaults
pub mod sentiment {
    pub const TIMEOUT_MS: u64 = 1_500;
}

/// Outbound messaging defaults
pub mod messaging {
    pub const MAX_RETRIES: u32 = 3;
    pub const INITIAL_BACKOFF_MS: u64 = 200;
    pub const TIMEOUT_MS: u64 = 5_000;
}

/// Session management defaults
pub mod session {
    pub const MAX_SESSIONS: usize = 10_000;
    /// 1 hour
    pub const IDLE_TIMEOUT_SECONDS: u64 = 3_600;
    /// 5 minutes
    pub const CLEANUP_INTERVAL_SECONDS: u64 = 300;
    pub const WORKER_IDLE_SECONDS: u64 = 60;
}
