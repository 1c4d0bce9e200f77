// Error types for the poem generator.
//
// Only precondition violations surface as errors. An exhausted ABAB search is
// an expected branch handled inside `generate_poem` and never reaches callers.

use thiserror::Error;

/// Why a poem could not be generated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// Sampling was attempted on an empty corpus.
    #[error("cannot draw a verse from an empty corpus")]
    EmptyCorpus,
    /// The corpus is below the configured minimum size for generation.
    #[error("corpus insufficient: {available} verses, at least {required} needed")]
    InsufficientCorpus { available: usize, required: usize },
}

/// A generator config that failed to parse or validate.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed generator config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid generator config: {0}")]
    Invalid(String),
}
