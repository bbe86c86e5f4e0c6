//! Term query implementation for exact term matching.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A query that matches documents containing a specific term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    /// The field to search in.
    field: String,
    /// The term to search for.
    term: String,
    /// The boost factor for this query.
    boost: f64,
}

impl TermQuery {
    /// Create a new term query.
    ///
    /// The term is matched exactly and is NOT analyzed; pass terms that
    /// already went through the field's analyzer.
    pub fn new<F, T>(field: F, term: T) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        TermQuery {
            field: field.into(),
            term: term.into(),
            boost: 1.0,
        }
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Get the boost factor.
    pub fn boost(&self) -> f64 {
        self.boost
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = boost;
        self
    }
}

impl fmt::Display for TermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.boost == 1.0 {
            write!(f, "{}:{}", self.field, self.term)
        } else {
            write!(f, "{}:{}^{}", self.field, self.term, self.boost)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_query_display() {
        let query = TermQuery::new("content", "hello");
        assert_eq!(query.to_string(), "content:hello");

        let boosted = TermQuery::new("content", "hello").with_boost(0.25);
        assert_eq!(boosted.to_string(), "content:hello^0.25");
        assert_eq!(boosted.boost(), 0.25);
    }
}
