//! Expanded queries built from a relevance model.

use log::debug;

use crate::error::Result;
use crate::feedback::relevance_model::RelevanceModel;
use crate::query::{BooleanQuery, TermQuery};

/// Separator between field name and term in qualified terms.
pub const FIELD_DELIMITER: char = ':';

/// Turns a relevance model into a weighted disjunction over one field.
#[derive(Debug, Clone)]
pub struct QueryExpander {
    field: String,
}

impl QueryExpander {
    pub fn new<S: Into<String>>(field: S) -> Self {
        QueryExpander {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// One SHOULD clause per model term, boosted by its weight.
    ///
    /// Terms containing [`FIELD_DELIMITER`] are left out. Fails when the
    /// model has more terms than a boolean query can hold.
    pub fn expand(&self, model: &RelevanceModel) -> Result<BooleanQuery> {
        let mut query = BooleanQuery::new();
        for entry in model.iter() {
            if entry.term.contains(FIELD_DELIMITER) {
                debug!("Skipping qualified term '{}'", entry.term);
                continue;
            }
            query.add_should(TermQuery::new(&self.field, &entry.term).with_boost(entry.weight))?;
        }
        debug!("Expanded query: {query}");
        Ok(query)
    }
}
