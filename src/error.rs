//! Error types for the rblm library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`RblmError`] enum. Conditions that are expected during a feedback run
//! (a document without a term vector, a term without collection statistics)
//! are not errors at all: they surface as `Option::None` at the accessor and
//! are handled where they occur.
//!
//! # Examples
//!
//! ```
//! use rblm::error::{RblmError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(RblmError::query("Cannot search with an empty query"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for rblm operations.
#[derive(Error, Debug)]
pub enum RblmError {
    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary index serialization errors.
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Index-related errors (missing index, unknown field).
    #[error("Index error: {0}")]
    Index(String),

    /// Analysis-related errors (tokenizer patterns, stopword files).
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Query-related errors (empty queries, too many clauses).
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed input files (topics, run files, documents).
    #[error("Parse error: {0}")]
    Parse(String),

    /// A normalization pass found no probability mass to normalize.
    #[error("Degenerate distribution: {0}")]
    DegenerateDistribution(String),

    /// A query id has no entry in a loaded result file.
    #[error("Query not found: {0}")]
    QueryNotFound(String),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with RblmError.
pub type Result<T> = std::result::Result<T, RblmError>;

impl RblmError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        RblmError::Index(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        RblmError::Analysis(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        RblmError::Query(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        RblmError::Config(msg.into())
    }

    /// Create a new parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        RblmError::Parse(msg.into())
    }

    /// Create a new degenerate distribution error.
    pub fn degenerate<S: Into<String>>(msg: S) -> Self {
        RblmError::DegenerateDistribution(msg.into())
    }

    /// Create a new query-not-found error.
    pub fn query_not_found<S: Into<String>>(query_id: S) -> Self {
        RblmError::QueryNotFound(query_id.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        RblmError::Other(format!("Internal error: {}", msg.into()))
    }

    /// Whether this error only affects the query being processed.
    ///
    /// Per-query failures are reported and the batch moves on; anything else
    /// means a shared resource is broken and the run should stop.
    pub fn is_query_scoped(&self) -> bool {
        matches!(
            self,
            RblmError::Query(_)
                | RblmError::DegenerateDistribution(_)
                | RblmError::QueryNotFound(_)
        )
    }
}
