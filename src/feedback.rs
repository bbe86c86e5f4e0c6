//! Relevance-model pseudo-relevance feedback.
//!
//! The pieces run in order for every query: a [`FeedbackSet`] is gathered
//! from the top of an initial ranking, the [`RelevanceModelEstimator`] turns
//! it into an RM1 distribution and mixes it with the query (RM3), and the
//! result either becomes an expanded query ([`QueryExpander`]) or reorders
//! the initial ranking by KL-divergence ([`Reranker`]).

pub mod expansion;
pub mod feedback_set;
pub mod relevance_model;
pub mod rerank;
pub mod smoothing;

pub use expansion::{FIELD_DELIMITER, QueryExpander};
pub use feedback_set::{FeedbackDocument, FeedbackSet, FeedbackTermStat};
pub use relevance_model::{
    RelevanceModel, RelevanceModelEstimator, RelevanceModelParams, WordProbability,
};
pub use rerank::{Reranker, ScoredDocument};
pub use smoothing::{collection_smoothed_mle, smoothed_mle};
