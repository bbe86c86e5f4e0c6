//! Boolean query implementation for combining term queries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RblmError, Result};
use crate::query::term::TermQuery;

/// Upper bound on the number of clauses in one boolean query.
pub const MAX_CLAUSE_COUNT: usize = 4096;

/// A disjunction of SHOULD term clauses.
///
/// A document matches when at least one clause matches; scores of matching
/// clauses add up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BooleanQuery {
    /// The clauses in this boolean query.
    clauses: Vec<TermQuery>,
}

impl BooleanQuery {
    /// Create a new empty boolean query.
    pub fn new() -> Self {
        BooleanQuery {
            clauses: Vec::new(),
        }
    }

    /// Disjunction of one unit-boost clause per term (duplicates kept).
    pub fn from_terms<S: AsRef<str>>(field: &str, terms: &[S]) -> Result<Self> {
        let mut query = BooleanQuery::new();
        for term in terms {
            query.add_should(TermQuery::new(field, term.as_ref()))?;
        }
        Ok(query)
    }

    /// Add a SHOULD clause.
    pub fn add_should(&mut self, query: TermQuery) -> Result<()> {
        if self.clauses.len() >= MAX_CLAUSE_COUNT {
            return Err(RblmError::query(format!(
                "Too many clauses: maximum is {MAX_CLAUSE_COUNT}"
            )));
        }
        self.clauses.push(query);
        Ok(())
    }

    /// Get the clauses.
    pub fn clauses(&self) -> &[TermQuery] {
        &self.clauses
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Check if this query is empty.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl fmt::Display for BooleanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_terms() {
        let query = BooleanQuery::from_terms("content", &["cat", "cat", "dog"]).unwrap();
        assert_eq!(query.len(), 3);
        assert_eq!(query.to_string(), "content:cat content:cat content:dog");
    }

    #[test]
    fn test_boosted_display() {
        let mut query = BooleanQuery::new();
        query.add_should(TermQuery::new("content", "rust")).unwrap();
        query
            .add_should(TermQuery::new("content", "web").with_boost(0.5))
            .unwrap();
        assert_eq!(query.to_string(), "content:rust content:web^0.5");
        assert_eq!(query.clauses()[1].boost(), 0.5);
    }

    #[test]
    fn test_clause_limit() {
        let mut query = BooleanQuery::new();
        for i in 0..MAX_CLAUSE_COUNT {
            query
                .add_should(TermQuery::new("content", format!("t{i}")))
                .unwrap();
        }
        let result = query.add_should(TermQuery::new("content", "overflow"));
        assert!(matches!(result, Err(RblmError::Query(_))));
        assert_eq!(query.len(), MAX_CLAUSE_COUNT);
    }
}
