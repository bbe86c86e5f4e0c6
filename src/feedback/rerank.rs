//! Reranking by KL-divergence from the relevance model.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::feedback::relevance_model::RelevanceModel;
use crate::feedback::smoothing::collection_smoothed_mle;
use crate::index::{
    CollectionStatistics, DocId, DocumentLookup, DocumentVector, DocumentVectorSource,
};
use crate::query::Hit;

/// A document with its divergence from the relevance model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub doc_id: DocId,
    pub external_id: String,
    /// KL-divergence; lower is better.
    pub score: f64,
}

impl ScoredDocument {
    /// Score written to run files: the negated divergence.
    pub fn emitted_score(&self) -> f64 {
        if self.score == 0.0 { 0.0 } else { -self.score }
    }
}

/// Reorders an initial ranking by `KL(R || d)`.
pub struct Reranker<'a, L: DocumentLookup + ?Sized> {
    stats: &'a dyn CollectionStatistics,
    vectors: &'a dyn DocumentVectorSource,
    lookup: &'a L,
    lambda: f64,
}

impl<'a, L: DocumentLookup + ?Sized> Reranker<'a, L> {
    pub fn new(
        stats: &'a dyn CollectionStatistics,
        vectors: &'a dyn DocumentVectorSource,
        lookup: &'a L,
        lambda: f64,
    ) -> Self {
        Reranker {
            stats,
            vectors,
            lookup,
            lambda,
        }
    }

    /// `Σ_t P(t|R)·ln(P(t|R) / P(t|d))` with a collection-smoothed document model.
    ///
    /// Terms with zero model weight or zero document probability are skipped.
    pub fn kl_divergence(&self, model: &RelevanceModel, doc: &DocumentVector) -> f64 {
        let mut divergence = 0.0;
        for entry in model.iter() {
            if entry.weight <= 0.0 {
                continue;
            }
            let p_doc = collection_smoothed_mle(&entry.term, doc, self.stats, self.lambda);
            if p_doc <= 0.0 {
                debug!(
                    "Term '{}' has zero probability in document {}, skipped",
                    entry.term,
                    doc.doc_id()
                );
                continue;
            }
            divergence += entry.weight * (entry.weight / p_doc).ln();
        }
        divergence
    }

    /// Score every hit and sort by ascending divergence.
    ///
    /// Ties keep the initial order. Hits without a term vector or an
    /// external id are dropped.
    pub fn rerank(&self, hits: &[Hit], model: &RelevanceModel) -> Result<Vec<ScoredDocument>> {
        let mut scored = Vec::with_capacity(hits.len());
        for hit in hits {
            let Some(vector) = self.vectors.document_vector(hit.doc_id)? else {
                warn!("Document {} has no term vector, dropped from rerank", hit.doc_id);
                continue;
            };
            let Some(external_id) = self.lookup.external_id(hit.doc_id) else {
                warn!("Document {} has no external id, dropped from rerank", hit.doc_id);
                continue;
            };
            scored.push(ScoredDocument {
                doc_id: hit.doc_id,
                external_id: external_id.to_string(),
                score: self.kl_divergence(model, &vector),
            });
        }

        scored.sort_by(|a, b| a.score.total_cmp(&b.score));
        Ok(scored)
    }
}
