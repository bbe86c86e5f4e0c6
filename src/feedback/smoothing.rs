//! Jelinek-Mercer smoothed maximum-likelihood term estimates.

use crate::index::{CollectionStatistics, DocumentVector};

/// `λ·tf/|d| + (1-λ)·bf/voc`.
///
/// An empty document contributes no document mass and an empty vocabulary
/// contributes no background mass; neither is an error.
pub fn smoothed_mle(
    term_freq: u64,
    doc_length: u64,
    background_freq: u64,
    vocabulary_size: u64,
    lambda: f64,
) -> f64 {
    let document = if doc_length == 0 {
        0.0
    } else {
        lambda * term_freq as f64 / doc_length as f64
    };
    let background = if vocabulary_size == 0 {
        0.0
    } else {
        (1.0 - lambda) * background_freq as f64 / vocabulary_size as f64
    };
    document + background
}

/// Smoothed estimate of `term` in `doc` against the whole collection.
///
/// Terms without collection statistics get no background mass.
pub fn collection_smoothed_mle(
    term: &str,
    doc: &DocumentVector,
    stats: &dyn CollectionStatistics,
    lambda: f64,
) -> f64 {
    smoothed_mle(
        doc.term_freq(term),
        doc.length(),
        stats.corpus_freq(term),
        stats.vocabulary_size(),
        lambda,
    )
}
