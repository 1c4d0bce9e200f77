// Tunable bounds for the poem generator.
//
// Every loop in `generator.rs` is bounded by a value from `GeneratorConfig`,
// so worst-case cost is predictable and seeded tests can pin the search down.
// Loaded from JSON (usually nested inside the server config); missing fields
// take their defaults, so `{}` is a valid config.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Longest free-form poem `validate` accepts.
pub const MAX_FREE_LINES: usize = 1024;

/// Inclusive range of line counts for a free-form poem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub min: usize,
    pub max: usize,
}

impl LineRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Bounds in ascending order, tolerating an unvalidated inverted range.
    pub fn bounds(&self) -> (usize, usize) {
        (self.min.min(self.max), self.min.max(self.max))
    }

    pub fn contains(&self, n: usize) -> bool {
        let (lo, hi) = self.bounds();
        (lo..=hi).contains(&n)
    }
}

/// Search bounds and shape parameters for `generate_poem`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Outer attempts at an ABAB quatrain before falling back to free form.
    pub abab_attempts: u32,
    /// Uniform draws spent looking for a rhyming, unused verse.
    pub rhyme_search_draws: u32,
    /// Ceiling on every reject-and-redraw loop (unused-verse fallback,
    /// distinct second line, free-poem diversity). Hitting it means
    /// "accept a repeat", never "fail".
    pub fallback_draw_limit: u32,
    /// Line count range for free-form poems.
    pub free_lines: LineRange,
    /// Smallest corpus `generate_poem` accepts.
    pub min_corpus_lines: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            abab_attempts: 50,
            rhyme_search_draws: 100,
            fallback_draw_limit: 1000,
            free_lines: LineRange::new(4, 14),
            min_corpus_lines: 4,
        }
    }
}

impl GeneratorConfig {
    /// Parse and validate a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.abab_attempts == 0 {
            return Err(ConfigError::Invalid("abab_attempts must be at least 1".into()));
        }
        if self.rhyme_search_draws == 0 {
            return Err(ConfigError::Invalid(
                "rhyme_search_draws must be at least 1".into(),
            ));
        }
        if self.fallback_draw_limit == 0 {
            return Err(ConfigError::Invalid(
                "fallback_draw_limit must be at least 1".into(),
            ));
        }
        if self.free_lines.min == 0 {
            return Err(ConfigError::Invalid("free_lines.min must be at least 1".into()));
        }
        if self.free_lines.min > self.free_lines.max {
            return Err(ConfigError::Invalid(format!(
                "free_lines range is inverted: {} > {}",
                self.free_lines.min, self.free_lines.max
            )));
        }
        if self.free_lines.max > MAX_FREE_LINES {
            return Err(ConfigError::Invalid(format!(
                "free_lines.max is {}, at most {MAX_FREE_LINES} allowed",
                self.free_lines.max
            )));
        }
        if self.min_corpus_lines == 0 {
            return Err(ConfigError::Invalid(
                "min_corpus_lines must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
