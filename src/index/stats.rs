//! Collection-level term statistics.
//!
//! Statistics are computed once from an index snapshot and then only read.
//! They are handed to every component that needs them as an explicit
//! `&dyn CollectionStatistics`.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Corpus-wide statistics of one term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermStat {
    pub term: String,
    /// Total occurrences across the collection.
    pub corpus_freq: u64,
    /// Number of documents containing the term.
    pub doc_freq: u64,
    /// `ln(N / (df + 1))`.
    pub idf: f64,
}

impl TermStat {
    pub fn new<S: Into<String>>(term: S, corpus_freq: u64, doc_freq: u64, doc_count: u64) -> Self {
        TermStat {
            term: term.into(),
            corpus_freq,
            doc_freq,
            idf: (doc_count as f64 / (doc_freq + 1) as f64).ln(),
        }
    }
}

/// Read-only access to collection statistics.
pub trait CollectionStatistics: Send + Sync {
    /// Statistics of `term`, `None` if the term never occurs in the collection.
    fn term_stat(&self, term: &str) -> Option<TermStat>;

    /// Total number of tokens in the collection (the vocabulary-size denominator).
    fn vocabulary_size(&self) -> u64;

    /// Number of documents in the collection.
    fn document_count(&self) -> u64;

    /// Corpus frequency of `term`, 0 when unknown.
    fn corpus_freq(&self, term: &str) -> u64 {
        self.term_stat(term).map(|s| s.corpus_freq).unwrap_or(0)
    }

    /// `cf(t) / |C|`, 0 for unknown terms or an empty collection.
    fn collection_probability(&self, term: &str) -> f64 {
        let vocabulary_size = self.vocabulary_size();
        if vocabulary_size == 0 {
            return 0.0;
        }
        self.corpus_freq(term) as f64 / vocabulary_size as f64
    }
}

/// In-memory snapshot of per-term statistics for one field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermStatistics {
    terms: AHashMap<String, (u64, u64)>,
    vocabulary_size: u64,
    document_count: u64,
}

impl TermStatistics {
    pub fn new(document_count: u64) -> Self {
        TermStatistics {
            terms: AHashMap::new(),
            vocabulary_size: 0,
            document_count,
        }
    }

    /// Record `tf` occurrences of `term` in one more document.
    pub fn record(&mut self, term: &str, tf: u64) {
        if tf == 0 {
            return;
        }
        let (cf, df) = self.terms.get(term).copied().unwrap_or((0, 0));
        self.terms.insert(term.to_string(), (cf + tf, df + 1));
        self.vocabulary_size += tf;
    }

    /// Set statistics of a term directly; mostly useful for synthetic collections.
    pub fn with_term<S: Into<String>>(mut self, term: S, corpus_freq: u64, doc_freq: u64) -> Self {
        let term = term.into();
        let previous = self.terms.insert(term, (corpus_freq, doc_freq));
        self.vocabulary_size = self
            .vocabulary_size
            .saturating_sub(previous.map(|(cf, _)| cf).unwrap_or(0))
            + corpus_freq;
        self
    }

    /// Override the token total (for collections whose stats are only partially listed).
    pub fn with_vocabulary_size(mut self, vocabulary_size: u64) -> Self {
        self.vocabulary_size = vocabulary_size;
        self
    }

    pub fn set_document_count(&mut self, document_count: u64) {
        self.document_count = document_count;
    }

    /// Number of distinct terms.
    pub fn unique_terms(&self) -> usize {
        self.terms.len()
    }

    /// Summary for reporting.
    pub fn summary(&self, field: &str) -> CollectionSummary {
        CollectionSummary {
            field: field.to_string(),
            document_count: self.document_count,
            vocabulary_size: self.vocabulary_size,
            unique_terms: self.terms.len() as u64,
            average_document_length: if self.document_count == 0 {
                0.0
            } else {
                self.vocabulary_size as f64 / self.document_count as f64
            },
        }
    }
}

impl CollectionStatistics for TermStatistics {
    fn term_stat(&self, term: &str) -> Option<TermStat> {
        self.terms
            .get(term)
            .map(|&(cf, df)| TermStat::new(term, cf, df, self.document_count))
    }

    fn vocabulary_size(&self) -> u64 {
        self.vocabulary_size
    }

    fn document_count(&self) -> u64 {
        self.document_count
    }

    fn corpus_freq(&self, term: &str) -> u64 {
        self.terms.get(term).map(|&(cf, _)| cf).unwrap_or(0)
    }
}

/// Collection-level numbers reported by `rblm stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub field: String,
    pub document_count: u64,
    pub vocabulary_size: u64,
    pub unique_terms: u64,
    pub average_document_length: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates() {
        let mut stats = TermStatistics::new(2);
        stats.record("cat", 2);
        stats.record("cat", 3);
        stats.record("dog", 1);

        let cat = stats.term_stat("cat").unwrap();
        assert_eq!(cat.corpus_freq, 5);
        assert_eq!(cat.doc_freq, 2);
        assert_eq!(stats.vocabulary_size(), 6);
        assert_eq!(stats.unique_terms(), 2);
    }

    #[test]
    fn test_idf() {
        let stat = TermStat::new("t", 10, 9, 100);
        assert!((stat.idf - (100.0f64 / 10.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_collection_probability() {
        let stats = TermStatistics::new(10)
            .with_term("cat", 10, 4)
            .with_vocabulary_size(1000);
        assert!((stats.collection_probability("cat") - 0.01).abs() < 1e-12);
        assert_eq!(stats.collection_probability("unknown"), 0.0);
        assert!(stats.term_stat("unknown").is_none());
    }

    #[test]
    fn test_with_term_replaces() {
        let stats = TermStatistics::new(1).with_term("a", 5, 1).with_term("a", 2, 1);
        assert_eq!(stats.corpus_freq("a"), 2);
        assert_eq!(stats.vocabulary_size(), 2);
    }

    #[test]
    fn test_empty_collection_probability() {
        let stats = TermStatistics::new(0);
        assert_eq!(stats.collection_probability("a"), 0.0);
        assert_eq!(stats.summary("content").average_document_length, 0.0);
    }
}
