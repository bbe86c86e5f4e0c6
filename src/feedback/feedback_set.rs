//! Feedback documents gathered from the top of an initial ranking.

use ahash::AHashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::feedback::smoothing::smoothed_mle;
use crate::index::{DocId, DocumentVector, DocumentVectorSource};
use crate::query::Hit;

/// Aggregated statistics of one term over the feedback documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackTermStat {
    /// Sum of the term's frequencies across feedback documents.
    pub corpus_freq: u64,
    /// Number of feedback documents containing the term.
    pub doc_freq: u64,
}

impl FeedbackTermStat {
    /// Combine two aggregates.
    pub fn merge(self, other: FeedbackTermStat) -> FeedbackTermStat {
        FeedbackTermStat {
            corpus_freq: self.corpus_freq + other.corpus_freq,
            doc_freq: self.doc_freq + other.doc_freq,
        }
    }
}

/// A feedback document with its query likelihood.
#[derive(Debug, Clone)]
pub struct FeedbackDocument {
    /// Position in the initial ranking (0-based).
    pub rank: usize,
    pub vector: DocumentVector,
    /// `P(Q|d)` against the feedback background.
    pub query_likelihood: f64,
}

impl FeedbackDocument {
    pub fn doc_id(&self) -> DocId {
        self.vector.doc_id()
    }
}

/// The pseudo-relevant documents of one query.
#[derive(Debug, Clone)]
pub struct FeedbackSet {
    documents: Vec<FeedbackDocument>,
    aggregate: AHashMap<String, FeedbackTermStat>,
    vocabulary_size: u64,
    lambda: f64,
}

impl FeedbackSet {
    /// Collect up to `num_feedback_docs` vectorized documents from `hits`.
    ///
    /// Hits without a stored term vector are skipped and do not count toward
    /// the quota. `vocabulary_size` is the collection token total of the
    /// feedback field and `lambda` the document weight of the smoothing.
    pub fn build(
        hits: &[Hit],
        num_feedback_docs: usize,
        vectors: &dyn DocumentVectorSource,
        query_terms: &[String],
        vocabulary_size: u64,
        lambda: f64,
    ) -> Result<Self> {
        let mut set = FeedbackSet {
            documents: Vec::with_capacity(num_feedback_docs.min(hits.len())),
            aggregate: AHashMap::new(),
            vocabulary_size,
            lambda,
        };

        for (rank, hit) in hits.iter().enumerate() {
            if set.documents.len() >= num_feedback_docs {
                break;
            }
            let Some(vector) = vectors.document_vector(hit.doc_id)? else {
                warn!(
                    "Document {} has no term vector, skipping it for feedback",
                    hit.doc_id
                );
                continue;
            };

            for (term, tf) in vector.terms() {
                let old = set.aggregate.get(term).copied().unwrap_or_default();
                let merged = old.merge(FeedbackTermStat {
                    corpus_freq: tf,
                    doc_freq: 1,
                });
                set.aggregate.insert(term.to_string(), merged);
            }
            set.documents.push(FeedbackDocument {
                rank,
                vector,
                query_likelihood: 0.0,
            });
        }

        let likelihoods: Vec<f64> = set
            .documents
            .iter()
            .map(|doc| set.query_likelihood(query_terms, &doc.vector))
            .collect();
        for (doc, likelihood) in set.documents.iter_mut().zip(likelihoods) {
            doc.query_likelihood = likelihood;
        }

        debug!(
            "Feedback set: {} documents, {} distinct terms",
            set.documents.len(),
            set.aggregate.len()
        );

        Ok(set)
    }

    /// Smoothed estimate of `term` in `doc` against the feedback aggregate.
    ///
    /// A term absent from the aggregate has probability 0.
    pub fn smoothed_mle(&self, term: &str, doc: &DocumentVector) -> f64 {
        match self.aggregate.get(term) {
            Some(stat) => smoothed_mle(
                doc.term_freq(term),
                doc.length(),
                stat.corpus_freq,
                self.vocabulary_size,
                self.lambda,
            ),
            None => 0.0,
        }
    }

    /// `P(Q|d)` over the analyzed query.
    ///
    /// A query term that no feedback document contains is a neutral factor of 1,
    /// so one unmatched term cannot zero out every document.
    fn query_likelihood(&self, query_terms: &[String], doc: &DocumentVector) -> f64 {
        query_terms
            .iter()
            .filter(|term| self.aggregate.contains_key(term.as_str()))
            .map(|term| self.smoothed_mle(term, doc))
            .product()
    }

    /// Feedback documents in rank order.
    pub fn documents(&self) -> &[FeedbackDocument] {
        &self.documents
    }

    /// Aggregate statistics of `term`.
    pub fn term_stat(&self, term: &str) -> Option<FeedbackTermStat> {
        self.aggregate.get(term).copied()
    }

    /// Distinct terms of all feedback documents, in no particular order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.aggregate.keys().map(String::as_str)
    }

    pub fn unique_terms(&self) -> usize {
        self.aggregate.len()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::RblmError;

    /// Vectors keyed by doc id; `None` entries have no stored vector.
    pub(crate) struct VectorTable(pub Vec<Option<DocumentVector>>);

    impl DocumentVectorSource for VectorTable {
        fn document_vector(&self, doc_id: DocId) -> Result<Option<DocumentVector>> {
            self.0
                .get(doc_id as usize)
                .cloned()
                .ok_or_else(|| RblmError::index(format!("no document {doc_id}")))
        }
    }

    pub(crate) fn sample_vectors() -> VectorTable {
        VectorTable(vec![
            Some(DocumentVector::from_term_freqs(0, [("cat", 2), ("dog", 1)])),
            None,
            Some(DocumentVector::from_term_freqs(2, [("dog", 3), ("bird", 1)])),
            Some(DocumentVector::from_term_freqs(3, [("fish", 4)])),
        ])
    }

    fn hits(ids: &[DocId]) -> Vec<Hit> {
        ids.iter()
            .enumerate()
            .map(|(i, &id)| Hit::new(id, 10.0 - i as f64))
            .collect()
    }

    #[test]
    fn test_skips_missing_vectors() {
        let vectors = sample_vectors();
        let query = vec!["cat".to_string()];
        let set = FeedbackSet::build(&hits(&[0, 1, 2, 3]), 2, &vectors, &query, 100, 0.5)
            .unwrap();

        assert_eq!(set.len(), 2);
        let ids: Vec<DocId> = set.documents().iter().map(|d| d.doc_id()).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(set.documents()[1].rank, 2);
    }

    #[test]
    fn test_aggregate() {
        let vectors = sample_vectors();
        let query = vec!["cat".to_string()];
        let set =
            FeedbackSet::build(&hits(&[0, 2]), 10, &vectors, &query, 100, 0.5).unwrap();

        assert_eq!(
            set.term_stat("dog"),
            Some(FeedbackTermStat {
                corpus_freq: 4,
                doc_freq: 2
            })
        );
        assert_eq!(set.term_stat("fish"), None);
        assert_eq!(set.unique_terms(), 3);
    }

    #[test]
    fn test_query_likelihood() {
        let vectors = sample_vectors();
        let query = vec!["cat".to_string(), "cat".to_string()];
        let set =
            FeedbackSet::build(&hits(&[0, 2]), 10, &vectors, &query, 100, 0.5).unwrap();

        // cat: 0.5 * 2/3 + 0.5 * 2/100, squared for the repeated term
        let p = 0.5 * 2.0 / 3.0 + 0.5 * 2.0 / 100.0;
        assert!((set.documents()[0].query_likelihood - p * p).abs() < 1e-12);
        let q = 0.5 * 2.0 / 100.0;
        assert!((set.documents()[1].query_likelihood - q * q).abs() < 1e-12);
    }

    #[test]
    fn test_unmatched_query_term_is_neutral() {
        let vectors = sample_vectors();
        let query = vec!["cat".to_string(), "whale".to_string()];
        let set =
            FeedbackSet::build(&hits(&[0, 2]), 10, &vectors, &query, 100, 0.5).unwrap();

        assert!(set.documents().iter().all(|d| d.query_likelihood > 0.0));
        let p = 0.5 * 2.0 / 3.0 + 0.5 * 2.0 / 100.0;
        assert!((set.documents()[0].query_likelihood - p).abs() < 1e-12);
        assert_eq!(set.smoothed_mle("whale", &set.documents()[0].vector), 0.0);

        let only_unmatched = vec!["whale".to_string()];
        let set =
            FeedbackSet::build(&hits(&[0]), 10, &vectors, &only_unmatched, 100, 0.5).unwrap();
        assert_eq!(set.documents()[0].query_likelihood, 1.0);
    }

    #[test]
    fn test_empty_and_storage_error() {
        let vectors = sample_vectors();
        let query = vec!["cat".to_string()];
        let set = FeedbackSet::build(&[], 10, &vectors, &query, 100, 0.5).unwrap();
        assert!(set.is_empty());

        let result = FeedbackSet::build(&hits(&[9]), 10, &vectors, &query, 100, 0.5);
        assert!(matches!(result, Err(RblmError::Index(_))));
    }
}
