//! Ranking functions used for initial retrieval.
//!
//! Every function scores a single (term, document) pair from a
//! [`TermScoringContext`]; clause scores are summed by the searcher.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RblmError, Result};

/// Per-term, per-document inputs for a ranking function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermScoringContext {
    /// Occurrences of the term in the document.
    pub term_freq: u64,
    /// Token count of the document.
    pub doc_length: u64,
    /// Mean document length in the field.
    pub avg_doc_length: f64,
    /// Documents in the collection.
    pub doc_count: u64,
    /// Documents containing the term.
    pub doc_freq: u64,
    /// Occurrences of the term in the collection.
    pub corpus_freq: u64,
    /// Tokens in the collection.
    pub total_tokens: u64,
}

/// Ranking function selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Similarity {
    /// Classic vector-space TF-IDF.
    Tfidf,
    /// Okapi BM25.
    Bm25 { k1: f64, b: f64 },
    /// Query likelihood with Jelinek-Mercer smoothing.
    LmJelinekMercer { lambda: f64 },
    /// Query likelihood with Dirichlet prior smoothing.
    LmDirichlet { mu: f64 },
}

impl Default for Similarity {
    fn default() -> Self {
        Similarity::Bm25 { k1: 1.2, b: 0.75 }
    }
}

impl Similarity {
    /// Reject parameters outside the function's domain.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Similarity::Tfidf => Ok(()),
            Similarity::Bm25 { k1, b } => {
                if k1 < 0.0 || !(0.0..=1.0).contains(&b) {
                    return Err(RblmError::config(format!(
                        "BM25 requires k1 >= 0 and b in [0, 1], got k1={k1}, b={b}"
                    )));
                }
                Ok(())
            }
            Similarity::LmJelinekMercer { lambda } => {
                if !(lambda > 0.0 && lambda <= 1.0) {
                    return Err(RblmError::config(format!(
                        "LM-JM lambda must be in (0, 1], got {lambda}"
                    )));
                }
                Ok(())
            }
            Similarity::LmDirichlet { mu } => {
                if mu <= 0.0 {
                    return Err(RblmError::config(format!(
                        "LM-Dirichlet mu must be positive, got {mu}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Score contribution of one matching term.
    pub fn score(&self, ctx: &TermScoringContext) -> f64 {
        if ctx.term_freq == 0 {
            return 0.0;
        }
        let tf = ctx.term_freq as f64;
        let n = ctx.doc_count as f64;
        let df = ctx.doc_freq as f64;
        let len = ctx.doc_length.max(1) as f64;

        match *self {
            Similarity::Tfidf => {
                let idf = 1.0 + (n / (df + 1.0)).ln();
                tf.sqrt() * idf * idf / len.sqrt()
            }
            Similarity::Bm25 { k1, b } => {
                let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
                let avg = if ctx.avg_doc_length > 0.0 {
                    ctx.avg_doc_length
                } else {
                    1.0
                };
                let norm = k1 * (1.0 - b + b * len / avg);
                idf * tf * (k1 + 1.0) / (tf + norm)
            }
            Similarity::LmJelinekMercer { lambda } => {
                let pc = collection_model(ctx);
                (1.0 + ((1.0 - lambda) * tf / len) / (lambda * pc)).ln()
            }
            Similarity::LmDirichlet { mu } => {
                let pc = collection_model(ctx);
                let score = (1.0 + tf / (mu * pc)).ln() + (mu / (len + mu)).ln();
                score.max(0.0)
            }
        }
    }

    /// Short name used in run tags, e.g. `BM25(k1=1.2,b=0.75)`.
    pub fn label(&self) -> String {
        match *self {
            Similarity::Tfidf => "DefaultSimilarity".to_string(),
            Similarity::Bm25 { k1, b } => format!("BM25(k1={k1},b={b})"),
            Similarity::LmJelinekMercer { lambda } => format!("LMJelinekMercer(lambda={lambda})"),
            Similarity::LmDirichlet { mu } => format!("LMDirichlet(mu={mu})"),
        }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn collection_model(ctx: &TermScoringContext) -> f64 {
    (ctx.corpus_freq as f64 + 1.0) / (ctx.total_tokens as f64 + 1.0)
}
