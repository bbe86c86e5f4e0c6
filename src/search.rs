//! Retrieval over an [`InMemoryIndex`](crate::index::InMemoryIndex).

pub mod searcher;
pub mod similarity;

pub use searcher::{IndexSearcher, Searcher};
pub use similarity::{Similarity, TermScoringContext};
