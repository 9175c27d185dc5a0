//! Token estimation for prompt budgeting.
//!
//! Converts between character counts and estimated token counts with a
//! fixed characters-per-token ratio. The default ratio is deliberately low
//! so that estimates over-count relative to real BPE tokenizers and a
//! packed prompt never silently exceeds the provider's limit.

// ---------------------------------------------------------------------------
// Trait (extensibility point)
// ---------------------------------------------------------------------------

/// Converts between characters and estimated tokens.
///
/// `chars_to_tokens` and `tokens_to_chars` must be inverses up to
/// rounding: `tokens_to_chars(chars_to_tokens(n)) >= n`.
pub trait TokenEstimator: Send + Sync {
    /// Estimated number of tokens needed for `chars` characters.
    fn chars_to_tokens(&self, chars: usize) -> usize;

    /// Number of characters that fit in `tokens` tokens.
    fn tokens_to_chars(&self, tokens: usize) -> usize;

    /// Estimate the number of tokens in `text`.
    fn estimate(&self, text: &str) -> usize {
        self.chars_to_tokens(char_len(text))
    }
}

// ---------------------------------------------------------------------------
// Character-based estimator
// ---------------------------------------------------------------------------

/// Conservative characters-per-token ratio (real tokenizers average ~4).
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 3.0;

/// Token estimator using a fixed characters-per-token ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharEstimator {
    chars_per_token: f64,
}

impl CharEstimator {
    /// Create an estimator with the given ratio.
    ///
    /// A ratio that is not finite and positive falls back to
    /// [`DEFAULT_CHARS_PER_TOKEN`].
    pub fn new(chars_per_token: f64) -> Self {
        let chars_per_token = if chars_per_token.is_finite() && chars_per_token > 0.0 {
            chars_per_token
        } else {
            DEFAULT_CHARS_PER_TOKEN
        };
        Self { chars_per_token }
    }

    pub fn chars_per_token(&self) -> f64 {
        self.chars_per_token
    }
}

impl Default for CharEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_CHARS_PER_TOKEN)
    }
}

impl TokenEstimator for CharEstimator {
    fn chars_to_tokens(&self, chars: usize) -> usize {
        (chars as f64 / self.chars_per_token).ceil() as usize
    }

    fn tokens_to_chars(&self, tokens: usize) -> usize {
        (tokens as f64 * self.chars_per_token).floor() as usize
    }
}

/// Length of `text` in characters (Unicode scalar values).
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
