//! Per-document term vectors.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Internal document identifier.
pub type DocId = u32;

/// Term-frequency map of one document for one field.
///
/// `length` is the token count of the document (the sum of all term
/// frequencies) and is the denominator of maximum-likelihood estimates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentVector {
    doc_id: DocId,
    terms: AHashMap<String, u64>,
    length: u64,
}

impl DocumentVector {
    /// Create an empty vector.
    pub fn new(doc_id: DocId) -> Self {
        DocumentVector {
            doc_id,
            terms: AHashMap::new(),
            length: 0,
        }
    }

    /// Build a vector from analyzed tokens (duplicates counted).
    pub fn from_tokens<S: AsRef<str>>(doc_id: DocId, tokens: &[S]) -> Self {
        let mut vector = DocumentVector::new(doc_id);
        for token in tokens {
            vector.add(token.as_ref(), 1);
        }
        vector
    }

    /// Build a vector from `(term, tf)` pairs. Repeated terms are summed.
    pub fn from_term_freqs<I, S>(doc_id: DocId, freqs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut vector = DocumentVector::new(doc_id);
        for (term, tf) in freqs {
            vector.add(term, tf);
        }
        vector
    }

    fn add<S: Into<String>>(&mut self, term: S, tf: u64) {
        if tf == 0 {
            return;
        }
        *self.terms.entry(term.into()).or_insert(0) += tf;
        self.length += tf;
    }

    pub fn doc_id(&self) -> DocId {
        self.doc_id
    }

    /// Frequency of `term` in this document, 0 if absent.
    pub fn term_freq(&self, term: &str) -> u64 {
        self.terms.get(term).copied().unwrap_or(0)
    }

    /// Token count of the document.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Iterate over `(term, tf)` pairs in no particular order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, u64)> {
        self.terms.iter().map(|(t, &tf)| (t.as_str(), tf))
    }

    /// Number of distinct terms.
    pub fn unique_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Access to stored term vectors.
///
/// `Ok(None)` means the document exists but no term vector was stored for
/// it, which is an expected condition callers skip over. `Err` is reserved
/// for storage failures.
pub trait DocumentVectorSource: Send + Sync {
    fn document_vector(&self, doc_id: DocId) -> Result<Option<DocumentVector>>;
}

/// Mapping between internal ids and the collection's external document ids.
pub trait DocumentLookup: Send + Sync {
    fn external_id(&self, doc_id: DocId) -> Option<&str>;

    fn doc_id_for(&self, external_id: &str) -> Option<DocId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tokens() {
        let vector = DocumentVector::from_tokens(7, &["cat", "dog", "cat"]);
        assert_eq!(vector.doc_id(), 7);
        assert_eq!(vector.term_freq("cat"), 2);
        assert_eq!(vector.term_freq("dog"), 1);
        assert_eq!(vector.term_freq("bird"), 0);
        assert_eq!(vector.length(), 3);
        assert_eq!(vector.unique_terms(), 2);
    }

    #[test]
    fn test_from_term_freqs_sums_duplicates() {
        let vector = DocumentVector::from_term_freqs(1, vec![("a", 2), ("b", 0), ("a", 3)]);
        assert_eq!(vector.term_freq("a"), 5);
        assert_eq!(vector.unique_terms(), 1);
        assert_eq!(vector.length(), 5);
    }

    #[test]
    fn test_empty() {
        let vector = DocumentVector::new(0);
        assert!(vector.is_empty());
        assert_eq!(vector.length(), 0);
    }
}
