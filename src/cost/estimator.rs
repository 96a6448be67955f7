//! Token counting.
//!
//! The generation collaborator reports usage when it can. When it does not,
//! a [`TokenCounter`] stands in. [`TokenEstimator`] is the default counter: a
//! fixed formula over character and word counts, so a replayed workspace
//! always prices the same.

use serde::{Deserialize, Serialize};

/// Characters per token assumed by [`EstimationMethod::CharacterBased`].
const CHARS_PER_TOKEN: f64 = 3.5;

/// Tokens per whitespace-separated word for [`EstimationMethod::WordBased`].
const TOKENS_PER_WORD: f64 = 1.3;

/// Multiplier applied on top of [`EstimationMethod::Conservative`].
const CONSERVATIVE_MARGIN: f64 = 1.2;

/// Anything that can put a token figure on a piece of text.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> u64;

    /// Counts for a prompt and the text it produced.
    fn count_exchange(&self, prompt: &str, output: &str) -> TokenCount {
        TokenCount::new(self.count(prompt), self.count(output))
    }
}

/// Which formula [`TokenEstimator`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMethod {
    /// `ceil(chars / 3.5)`
    CharacterBased,
    /// `ceil(words * 1.3)`
    WordBased,
    /// The larger of the two, then scaled by 1.2
    #[default]
    Conservative,
}

/// Deterministic [`TokenCounter`] configured by an [`EstimationMethod`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenEstimator {
    method: EstimationMethod,
}

impl TokenEstimator {
    pub fn new(method: EstimationMethod) -> Self {
        Self { method }
    }

    /// Token figure for `text` under the configured method. Empty text is zero.
    pub fn estimate(&self, text: &str) -> u64 {
        self.count(text)
    }
}

impl TokenCounter for TokenEstimator {
    fn count(&self, text: &str) -> u64 {
        let by_chars = (text.chars().count() as f64 / CHARS_PER_TOKEN).ceil();
        let by_words = (text.split_whitespace().count() as f64 * TOKENS_PER_WORD).ceil();
        let tokens = match self.method {
            EstimationMethod::CharacterBased => by_chars,
            EstimationMethod::WordBased => by_words,
            EstimationMethod::Conservative => (by_chars.max(by_words) * CONSERVATIVE_MARGIN).ceil(),
        };
        tokens as u64
    }
}

/// Input and output tokens of one exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCount {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenCount {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Both sides together, pinned at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}
