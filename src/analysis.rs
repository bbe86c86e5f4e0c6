//! Text analysis for documents and queries.
//!
//! Indexing and query processing must agree on how raw text becomes terms,
//! so both go through an [`Analyzer`]. The default pipeline is
//! regex tokenization, lowercasing, possessive stripping, stop word removal
//! and Porter2 stemming.

pub mod analyzer;
pub mod stop;
pub mod tokenizer;

pub use analyzer::{Analyzer, AnalyzerKind, EnglishAnalyzer, WhitespaceAnalyzer};
pub use stop::StopFilter;
pub use tokenizer::RegexTokenizer;
