//! Regex-based tokenizer implementation.

use std::sync::Arc;

use regex::Regex;

use crate::error::{RblmError, Result};

/// A regex-based tokenizer that extracts tokens using regular expressions.
///
/// The default pattern keeps letter-led runs of letters, digits, underscores
/// and apostrophes together, so possessives survive tokenization and can be
/// stripped by the analyzer.
#[derive(Clone, Debug)]
pub struct RegexTokenizer {
    /// The regex pattern used to extract tokens
    pattern: Arc<Regex>,
}

impl RegexTokenizer {
    /// Default token pattern.
    pub const DEFAULT_PATTERN: &'static str = r"(?u)[\p{L}\p{N}][\p{L}\p{N}_']*";

    /// Create a new regex tokenizer with the default pattern.
    pub fn new() -> Result<Self> {
        Self::with_pattern(Self::DEFAULT_PATTERN)
    }

    /// Create a new regex tokenizer with a custom pattern.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| RblmError::analysis(format!("Invalid regex pattern: {e}")))?;

        Ok(RegexTokenizer {
            pattern: Arc::new(regex),
        })
    }

    /// Get the regex pattern used by this tokenizer.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Split text into raw (unnormalized) tokens.
    pub fn tokenize<'t>(&self, text: &'t str) -> impl Iterator<Item = &'t str> {
        self.pattern.find_iter(text).map(|m| m.as_str())
    }
}

impl Default for RegexTokenizer {
    fn default() -> Self {
        Self::new().expect("Default regex pattern should be valid")
    }
}
