//! # rblm
//!
//! Relevance-based language models for pseudo-relevance feedback, as used in
//! TREC-style retrieval experiments.
//!
//! ## Features
//!
//! - RM1 and RM3 estimation from the top documents of an initial ranking
//! - Query expansion with the estimated model, or reranking by KL-divergence
//! - Small in-memory index with stored term vectors and collection statistics
//! - TF-IDF, BM25 and language-model similarities for initial retrieval
//! - TREC topic and run file I/O, batch runs on a rayon pool
//!
//! ## Example
//!
//! ```
//! use rblm::feedback::{RelevanceModel, RelevanceModelEstimator, RelevanceModelParams};
//!
//! let rm1 = RelevanceModel::from_weights([("a", 0.6), ("b", 0.3), ("c", 0.1)]);
//! let estimator = RelevanceModelEstimator::new(RelevanceModelParams {
//!     num_feedback_terms: 2,
//!     query_mix: 0.5,
//! });
//! let rm3 = estimator.rm3(rm1, &["a".to_string()]).unwrap();
//! assert!((rm3.total_weight() - 1.0).abs() < 1e-9);
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod feedback;
pub mod index;
pub mod pipeline;
pub mod query;
pub mod search;
pub mod trec;

pub mod prelude {
    pub use crate::analysis::{Analyzer, AnalyzerKind, EnglishAnalyzer};
    pub use crate::config::RunConfig;
    pub use crate::error::{RblmError, Result};
    pub use crate::feedback::{
        FeedbackSet, QueryExpander, RelevanceModel, RelevanceModelEstimator,
        RelevanceModelParams, Reranker,
    };
    pub use crate::index::{CollectionStatistics, DocumentVector, DocumentVectorSource, InMemoryIndex};
    pub use crate::pipeline::{BatchReport, RelevanceFeedback};
    pub use crate::search::{IndexSearcher, Searcher, Similarity};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
