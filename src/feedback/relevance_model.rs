//! RM1 and RM3 relevance model estimation.

use std::cmp::Ordering;

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{RblmError, Result};
use crate::feedback::feedback_set::FeedbackSet;

/// A term and its weight in a relevance model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordProbability {
    pub term: String,
    pub weight: f64,
}

impl WordProbability {
    pub fn new<S: Into<String>>(term: S, weight: f64) -> Self {
        WordProbability {
            term: term.into(),
            weight,
        }
    }
}

/// Term distribution ordered by non-increasing weight.
///
/// `positions` maps every term to its index in `entries` and is rebuilt
/// whenever the order changes.
#[derive(Debug, Clone, Default)]
pub struct RelevanceModel {
    entries: Vec<WordProbability>,
    positions: AHashMap<String, usize>,
}

impl RelevanceModel {
    pub fn new() -> Self {
        RelevanceModel::default()
    }

    /// Build a sorted model from `(term, weight)` pairs; repeated terms are summed.
    pub fn from_weights<I, S>(weights: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut model = RelevanceModel::new();
        for (term, weight) in weights {
            model.add_weight(term, weight);
        }
        model.sort();
        model
    }

    /// Add `weight` to `term`, appending it if absent. Does not re-sort.
    pub fn add_weight<S: Into<String>>(&mut self, term: S, weight: f64) {
        let term = term.into();
        match self.positions.get(&term) {
            Some(&pos) => self.entries[pos].weight += weight,
            None => {
                self.positions.insert(term.clone(), self.entries.len());
                self.entries.push(WordProbability::new(term, weight));
            }
        }
    }

    /// Order by weight descending, then term ascending.
    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.term.cmp(&b.term))
        });
        self.reindex();
    }

    fn reindex(&mut self) {
        self.positions.clear();
        for (pos, entry) in self.entries.iter().enumerate() {
            self.positions.insert(entry.term.clone(), pos);
        }
    }

    /// Keep the first `len` entries.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.entries.len() {
            return;
        }
        for entry in self.entries.drain(len..) {
            self.positions.remove(&entry.term);
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// Scale all weights so that they sum to 1.
    pub fn normalize(&mut self) -> Result<()> {
        let total = self.total_weight();
        self.normalize_by(total)
    }

    /// Divide all weights by `total`, which must be positive and finite.
    pub fn normalize_by(&mut self, total: f64) -> Result<()> {
        if !(total > 0.0 && total.is_finite()) {
            return Err(RblmError::degenerate(format!(
                "cannot normalize {} terms with total weight {total}",
                self.entries.len()
            )));
        }
        for entry in &mut self.entries {
            entry.weight /= total;
        }
        Ok(())
    }

    pub fn scale(&mut self, factor: f64) {
        for entry in &mut self.entries {
            entry.weight *= factor;
        }
    }

    /// Weight of `term`, `None` if the term is not in the model.
    pub fn get(&self, term: &str) -> Option<f64> {
        self.positions.get(term).map(|&pos| self.entries[pos].weight)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.positions.contains_key(term)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordProbability> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[WordProbability] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<WordProbability> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parameters of RM3 estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelevanceModelParams {
    /// Feedback terms kept before mixing with the query.
    pub num_feedback_terms: usize,
    /// Weight of the feedback distribution against the query (QMIX).
    pub query_mix: f64,
}

impl Default for RelevanceModelParams {
    fn default() -> Self {
        RelevanceModelParams {
            num_feedback_terms: 50,
            query_mix: 0.98,
        }
    }
}

/// Estimates relevance models from feedback sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelevanceModelEstimator {
    params: RelevanceModelParams,
}

impl RelevanceModelEstimator {
    pub fn new(params: RelevanceModelParams) -> Self {
        RelevanceModelEstimator { params }
    }

    pub fn params(&self) -> &RelevanceModelParams {
        &self.params
    }

    /// RM1: `P(t|R) = Σ_d P(t|d)·P(Q|d)` over every feedback term.
    ///
    /// The result is sorted but neither truncated nor normalized.
    pub fn rm1(&self, feedback: &FeedbackSet) -> RelevanceModel {
        let mut model = RelevanceModel::new();
        for term in feedback.terms() {
            let weight: f64 = feedback
                .documents()
                .iter()
                .map(|doc| feedback.smoothed_mle(term, &doc.vector) * doc.query_likelihood)
                .sum();
            model.add_weight(term, weight);
        }
        model.sort();
        model
    }

    /// RM3: interpolate the truncated, normalized RM1 with the query model.
    pub fn rm3(&self, mut model: RelevanceModel, query_terms: &[String]) -> Result<RelevanceModel> {
        let qmix = self.params.query_mix;

        model.truncate(self.params.num_feedback_terms);
        if self.params.num_feedback_terms > 0 {
            model.normalize()?;
        }
        model.scale(qmix);

        let total = mix_query(&mut model, query_terms, 1.0 - qmix);
        model.normalize_by(total)?;
        model.sort();

        debug!(
            "RM3 with {} terms (query mix {qmix}, {} query terms)",
            model.len(),
            query_terms.len()
        );

        Ok(model)
    }

    /// RM1 followed by RM3.
    pub fn estimate(&self, feedback: &FeedbackSet, query_terms: &[String]) -> Result<RelevanceModel> {
        let rm1 = self.rm1(feedback);
        self.rm3(rm1, query_terms)
    }
}

/// Add `weight · count(w)/|Q|` once per query term occurrence, in query
/// order, and return the running total weight of the model.
///
/// A term repeated in the query receives its increment once per occurrence.
/// Zero increments neither change weights nor insert terms.
pub(crate) fn mix_query(model: &mut RelevanceModel, query_terms: &[String], weight: f64) -> f64 {
    let mut total = model.total_weight();
    if query_terms.is_empty() {
        return total;
    }

    let query_len = query_terms.len() as f64;
    for term in query_terms {
        let count = query_terms.iter().filter(|t| *t == term).count();
        let increment = weight * count as f64 / query_len;
        if increment <= 0.0 {
            continue;
        }
        model.add_weight(term.as_str(), increment);
        total += increment;
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::feedback_set::tests::sample_vectors;
    use crate::query::Hit;

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn assert_sums_to_one(model: &RelevanceModel) {
        assert!((model.total_weight() - 1.0).abs() < 1e-6);
    }

    fn assert_non_increasing(model: &RelevanceModel) {
        for pair in model.entries().windows(2) {
            assert!(pair[0].weight >= pair[1].weight);
        }
    }

    #[test]
    fn test_model_lookup_stays_in_sync() {
        let mut model = RelevanceModel::from_weights([("b", 0.3), ("a", 0.6), ("c", 0.1)]);
        assert_eq!(model.entries()[0].term, "a");
        assert_eq!(model.get("c"), Some(0.1));

        model.truncate(2);
        assert_eq!(model.get("c"), None);
        assert!(!model.contains("c"));

        model.add_weight("c", 0.9);
        model.sort();
        assert_eq!(model.entries()[0].term, "c");
        assert_eq!(model.get("a"), Some(0.6));
    }

    #[test]
    fn test_ties_are_lexicographic() {
        let model = RelevanceModel::from_weights([("zeta", 0.5), ("alpha", 0.5), ("mid", 0.5)]);
        let order: Vec<&str> = model.iter().map(|e| e.term.as_str()).collect();
        assert_eq!(order, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_truncate_and_normalize() {
        let mut model = RelevanceModel::from_weights([("a", 0.6), ("b", 0.3), ("c", 0.1)]);
        model.truncate(2);
        model.normalize().unwrap();

        assert_eq!(model.len(), 2);
        assert!((model.get("a").unwrap() - 0.6667).abs() < 1e-3);
        assert!((model.get("b").unwrap() - 0.3333).abs() < 1e-3);
    }

    #[test]
    fn test_normalize_zero_is_degenerate() {
        let mut model = RelevanceModel::from_weights([("a", 0.0)]);
        assert!(matches!(
            model.normalize(),
            Err(RblmError::DegenerateDistribution(_))
        ));
        assert!(RelevanceModel::new().normalize().is_err());
    }

    #[test]
    fn test_query_mix_inserts_missing_terms() {
        let mut model = RelevanceModel::from_weights([("dog", 0.5), ("bird", 0.5)]);
        model.scale(0.9);
        let total = mix_query(&mut model, &terms(&["cat", "cat", "dog"]), 0.1);

        // cat is inserted at 0.1 * 2/3 and incremented again for its second occurrence
        assert!((model.get("cat").unwrap() - 0.1333).abs() < 1e-4);
        assert!((model.get("dog").unwrap() - (0.45 + 0.1 / 3.0)).abs() < 1e-9);
        assert!((total - (0.9 + 0.5 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_query_mix_single_occurrence_insert() {
        let mut model = RelevanceModel::from_weights([("dog", 0.9)]);
        mix_query(&mut model, &terms(&["cat", "dog", "dog"]), 0.1);
        assert!((model.get("cat").unwrap() - 0.1 / 3.0).abs() < 1e-9);
        assert!((model.get("dog").unwrap() - (0.9 + 2.0 * 0.2 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_rm3_properties() {
        let estimator = RelevanceModelEstimator::new(RelevanceModelParams {
            num_feedback_terms: 2,
            query_mix: 0.5,
        });
        let rm1 = RelevanceModel::from_weights([("a", 0.6), ("b", 0.3), ("c", 0.1)]);
        let model = estimator.rm3(rm1, &terms(&["q", "a"])).unwrap();

        assert_sums_to_one(&model);
        assert_non_increasing(&model);
        assert_eq!(model.len(), 3);
        assert!(!model.contains("c"));
        // a: 0.5 * 2/3 + 0.5 * 1/2
        assert!((model.get("a").unwrap() - (1.0 / 3.0 + 0.25)).abs() < 1e-9);
        assert!((model.get("q").unwrap() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_rm3_degenerate_feedback() {
        let estimator = RelevanceModelEstimator::default();
        let rm1 = RelevanceModel::from_weights([("a", 0.0), ("b", 0.0)]);
        let result = estimator.rm3(rm1, &terms(&["a"]));
        assert!(matches!(result, Err(RblmError::DegenerateDistribution(_))));
    }

    #[test]
    fn test_rm3_without_feedback_terms() {
        let estimator = RelevanceModelEstimator::new(RelevanceModelParams {
            num_feedback_terms: 0,
            query_mix: 0.9,
        });
        let rm1 = RelevanceModel::from_weights([("a", 0.6)]);
        let model = estimator.rm3(rm1, &terms(&["x", "y", "x"])).unwrap();

        // x: 2 * 0.1 * 2/3, y: 0.1 * 1/3, renormalized
        assert_sums_to_one(&model);
        assert!((model.get("x").unwrap() - 0.8).abs() < 1e-9);
        assert!((model.get("y").unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(model.entries()[0].term, "x");
    }

    #[test]
    fn test_estimate_from_feedback_set() {
        let vectors = sample_vectors();
        let query = terms(&["dog"]);
        let hits = vec![Hit::new(0, 2.0), Hit::new(2, 1.0)];
        let feedback = FeedbackSet::build(&hits, 10, &vectors, &query, 1000, 0.5).unwrap();

        let estimator = RelevanceModelEstimator::new(RelevanceModelParams {
            num_feedback_terms: 3,
            query_mix: 0.8,
        });
        let rm1 = estimator.rm1(&feedback);
        assert_eq!(rm1.len(), 3);
        assert_non_increasing(&rm1);
        assert_eq!(rm1.entries()[0].term, "dog");

        let model = estimator.estimate(&feedback, &query).unwrap();
        assert_sums_to_one(&model);
        assert!(model.len() <= 3 + 1);
    }

    #[test]
    fn test_estimate_with_unmatched_query_term() {
        let vectors = sample_vectors();
        let query = terms(&["cat", "whale"]);
        let hits = vec![Hit::new(0, 2.0), Hit::new(2, 1.0)];
        let feedback = FeedbackSet::build(&hits, 10, &vectors, &query, 100, 0.5).unwrap();
        assert!(feedback.documents().iter().all(|d| d.query_likelihood > 0.0));

        let estimator = RelevanceModelEstimator::default();
        let model = estimator.estimate(&feedback, &query).unwrap();
        assert_sums_to_one(&model);
        assert!(model.contains("whale"));
        assert!(model.contains("bird"));
    }
}
