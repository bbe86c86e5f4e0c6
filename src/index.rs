//! Index-side collaborators of the feedback engine.
//!
//! The relevance model only ever sees an index through two read-only traits:
//! [`DocumentVectorSource`] for per-document term vectors and
//! [`CollectionStatistics`] for corpus-level counts. [`InMemoryIndex`] is the
//! concrete index used by the command line tool.

pub mod memory;
pub mod stats;
pub mod vector;

pub use memory::{FieldIndex, InMemoryIndex, IndexBuilder, SourceDocument};
pub use stats::{CollectionStatistics, CollectionSummary, TermStat, TermStatistics};
pub use vector::{DocId, DocumentLookup, DocumentVector, DocumentVectorSource};
