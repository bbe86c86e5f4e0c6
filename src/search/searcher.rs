//! Term-at-a-time boolean retrieval.

use std::cmp::Ordering;

use ahash::AHashMap;
use log::debug;

use crate::error::{RblmError, Result};
use crate::index::{CollectionStatistics, DocId, DocumentLookup, InMemoryIndex};
use crate::query::{BooleanQuery, Hit};
use crate::search::similarity::{Similarity, TermScoringContext};

/// Something that can run a boolean query and resolve document ids.
pub trait Searcher: DocumentLookup {
    /// Top `limit` hits by descending score; ties broken by ascending doc id.
    fn search(&self, query: &BooleanQuery, limit: usize) -> Result<Vec<Hit>>;

    /// Number of documents that can be returned.
    fn doc_count(&self) -> usize;
}

/// Searcher over an [`InMemoryIndex`].
#[derive(Debug, Clone, Copy)]
pub struct IndexSearcher<'a> {
    index: &'a InMemoryIndex,
    similarity: Similarity,
}

impl<'a> IndexSearcher<'a> {
    pub fn new(index: &'a InMemoryIndex, similarity: Similarity) -> Self {
        IndexSearcher { index, similarity }
    }

    pub fn similarity(&self) -> Similarity {
        self.similarity
    }

    pub fn index(&self) -> &'a InMemoryIndex {
        self.index
    }
}

impl DocumentLookup for IndexSearcher<'_> {
    fn external_id(&self, doc_id: DocId) -> Option<&str> {
        self.index.external_id(doc_id)
    }

    fn doc_id_for(&self, external_id: &str) -> Option<DocId> {
        self.index.doc_id_for(external_id)
    }
}

impl Searcher for IndexSearcher<'_> {
    fn search(&self, query: &BooleanQuery, limit: usize) -> Result<Vec<Hit>> {
        if query.is_empty() {
            return Err(RblmError::query("Cannot search with an empty query"));
        }

        let mut accumulators: AHashMap<DocId, f64> = AHashMap::new();

        for clause in query.clauses() {
            let field = self.index.field(clause.field())?;
            let term = clause.term();
            let postings = field.postings(term);
            if postings.is_empty() {
                continue;
            }

            let stats = field.stats();
            let doc_freq = postings.len() as u64;
            let corpus_freq = stats.corpus_freq(term);
            let avg_doc_length = field.average_length();

            for posting in postings {
                let ctx = TermScoringContext {
                    term_freq: posting.term_freq,
                    doc_length: field.doc_length(posting.doc_id),
                    avg_doc_length,
                    doc_count: stats.document_count(),
                    doc_freq,
                    corpus_freq,
                    total_tokens: stats.vocabulary_size(),
                };
                *accumulators.entry(posting.doc_id).or_default() +=
                    clause.boost() * self.similarity.score(&ctx);
            }
        }

        let mut hits: Vec<Hit> = accumulators
            .into_iter()
            .map(|(doc_id, score)| Hit::new(doc_id, score))
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        hits.truncate(limit);
        debug!("Query '{query}' returned {} hits", hits.len());

        Ok(hits)
    }

    fn doc_count(&self) -> usize {
        self.index.doc_count()
    }
}
