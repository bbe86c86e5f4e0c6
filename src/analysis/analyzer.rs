//! Analyzers turning raw text into index terms.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};

use crate::analysis::stop::StopFilter;
use crate::analysis::tokenizer::RegexTokenizer;
use crate::error::Result;

/// Trait for analyzers.
///
/// Implementations must be shareable across threads: the same analyzer is
/// used for every query of a batch, possibly from several workers.
pub trait Analyzer: Send + Sync + fmt::Debug {
    /// Analyze text into a sequence of normalized terms (duplicates kept, in order).
    fn analyze(&self, text: &str) -> Result<Vec<String>>;

    /// Get the name of this analyzer for debugging and logging.
    fn name(&self) -> &str;
}

/// English analyzer.
///
/// # Pipeline
///
/// 1. RegexTokenizer
/// 2. Lowercasing
/// 3. Possessive (`'s`) stripping
/// 4. StopFilter
/// 5. Porter2 stemming (optional)
pub struct EnglishAnalyzer {
    tokenizer: RegexTokenizer,
    stop_filter: StopFilter,
    stemmer: Option<Stemmer>,
}

impl EnglishAnalyzer {
    /// Create an English analyzer with the default stop words and stemming.
    pub fn new() -> Result<Self> {
        Ok(EnglishAnalyzer {
            tokenizer: RegexTokenizer::new()?,
            stop_filter: StopFilter::new(),
            stemmer: Some(Stemmer::create(Algorithm::English)),
        })
    }

    /// Replace the stop word list.
    pub fn with_stop_filter(mut self, stop_filter: StopFilter) -> Self {
        self.stop_filter = stop_filter;
        self
    }

    /// Enable or disable stemming.
    pub fn with_stemming(mut self, enabled: bool) -> Self {
        self.stemmer = enabled.then(|| Stemmer::create(Algorithm::English));
        self
    }

    fn normalize(&self, raw: &str) -> Option<String> {
        let lower = raw.to_lowercase();
        let token = lower
            .strip_suffix("'s")
            .unwrap_or(lower.as_str())
            .trim_end_matches('\'');

        if token.is_empty()
            || self.stop_filter.is_stop_word(token)
            || self.stop_filter.is_stop_word(&lower)
        {
            return None;
        }

        Some(match &self.stemmer {
            Some(stemmer) => stemmer.stem(token).into_owned(),
            None => token.to_string(),
        })
    }
}

impl Default for EnglishAnalyzer {
    fn default() -> Self {
        Self::new().expect("English analyzer should be creatable with default settings")
    }
}

impl fmt::Debug for EnglishAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnglishAnalyzer")
            .field("pattern", &self.tokenizer.pattern())
            .field("stop_words", &self.stop_filter.len())
            .field("stemming", &self.stemmer.is_some())
            .finish()
    }
}

impl Analyzer for EnglishAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<String>> {
        Ok(self
            .tokenizer
            .tokenize(text)
            .filter_map(|raw| self.normalize(raw))
            .collect())
    }

    fn name(&self) -> &str {
        "english"
    }
}

/// Splits on whitespace only; for text that was analyzed upstream.
#[derive(Debug, Clone, Default)]
pub struct WhitespaceAnalyzer;

impl WhitespaceAnalyzer {
    pub fn new() -> Self {
        WhitespaceAnalyzer
    }
}

impl Analyzer for WhitespaceAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<String>> {
        Ok(text.split_whitespace().map(str::to_string).collect())
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}

/// Analyzer selection for the command line and configuration files.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalyzerKind {
    /// EnglishAnalyzer with Porter2 stemming
    #[default]
    English,
    /// EnglishAnalyzer without stemming
    EnglishNoStem,
    /// WhitespaceAnalyzer
    Whitespace,
}

impl AnalyzerKind {
    /// Build the analyzer, reading stop words from `stopwords` if given.
    pub fn build(self, stopwords: Option<&Path>) -> Result<Arc<dyn Analyzer>> {
        let english = |stemming: bool| -> Result<Arc<dyn Analyzer>> {
            let mut analyzer = EnglishAnalyzer::new()?.with_stemming(stemming);
            if let Some(path) = stopwords {
                analyzer = analyzer.with_stop_filter(StopFilter::from_file(path)?);
            }
            Ok(Arc::new(analyzer))
        };
        match self {
            AnalyzerKind::English => english(true),
            AnalyzerKind::EnglishNoStem => english(false),
            AnalyzerKind::Whitespace => Ok(Arc::new(WhitespaceAnalyzer::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_analyzer() {
        let analyzer = EnglishAnalyzer::new().unwrap();
        let terms = analyzer.analyze("The Runners were running with the dog's ball").unwrap();

        assert!(!terms.contains(&"the".to_string()));
        assert!(!terms.contains(&"with".to_string()));
        assert!(terms.contains(&"runner".to_string()));
        assert!(terms.contains(&"run".to_string()));
        assert!(terms.contains(&"dog".to_string()));
    }

    #[test]
    fn test_duplicates_preserved() {
        let analyzer = EnglishAnalyzer::new().unwrap();
        let terms = analyzer.analyze("cat cat dog").unwrap();
        assert_eq!(terms, vec!["cat", "cat", "dog"]);
    }

    #[test]
    fn test_without_stemming() {
        let analyzer = EnglishAnalyzer::new().unwrap().with_stemming(false);
        let terms = analyzer.analyze("Running quickly").unwrap();
        assert_eq!(terms, vec!["running", "quickly"]);
    }

    #[test]
    fn test_custom_stop_words() {
        let analyzer = EnglishAnalyzer::new()
            .unwrap()
            .with_stemming(false)
            .with_stop_filter(StopFilter::from_words(vec!["quickly"]));
        let terms = analyzer.analyze("the fox ran quickly").unwrap();
        assert_eq!(terms, vec!["the", "fox", "ran"]);
    }

    #[test]
    fn test_whitespace_analyzer() {
        let analyzer = WhitespaceAnalyzer::new();
        let terms = analyzer.analyze("  already analyzed\tterms ").unwrap();
        assert_eq!(terms, vec!["already", "analyzed", "terms"]);
    }

    #[test]
    fn test_analyzer_kind() {
        let analyzer = AnalyzerKind::EnglishNoStem.build(None).unwrap();
        assert_eq!(analyzer.name(), "english");
        assert_eq!(analyzer.analyze("Running dogs").unwrap(), vec!["running", "dogs"]);

        let analyzer = AnalyzerKind::Whitespace.build(None).unwrap();
        assert_eq!(analyzer.name(), "whitespace");

        let kind: AnalyzerKind = serde_json::from_str("\"english-no-stem\"").unwrap();
        assert_eq!(kind, AnalyzerKind::EnglishNoStem);
    }
}
