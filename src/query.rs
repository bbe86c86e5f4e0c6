//! Query types for initial retrieval and re-retrieval.

pub mod boolean;
pub mod term;

use serde::{Deserialize, Serialize};

use crate::index::DocId;

pub use boolean::{BooleanQuery, MAX_CLAUSE_COUNT};
pub use term::TermQuery;

/// A search hit: internal document id and retrieval score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// The document ID.
    pub doc_id: DocId,
    /// The retrieval score.
    pub score: f64,
}

impl Hit {
    pub fn new(doc_id: DocId, score: f64) -> Self {
        Hit { doc_id, score }
    }
}
