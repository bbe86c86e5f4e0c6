//! Per-query feedback runs over a batch of topics.
//!
//! For every topic the title is analyzed, an initial ranking is obtained
//! (live search or a loaded run file), a relevance model is estimated from
//! the top documents and used either to re-retrieve with an expanded query
//! or to rerank the initial list.

use std::io::Write;

use log::{info, warn};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::Analyzer;
use crate::config::RunConfig;
use crate::error::{RblmError, Result};
use crate::feedback::{
    FeedbackSet, QueryExpander, RelevanceModel, RelevanceModelEstimator, Reranker,
};
use crate::index::{CollectionStatistics, DocumentVectorSource};
use crate::query::{BooleanQuery, Hit};
use crate::search::Searcher;
use crate::trec::{RunFile, RunWriter, TrecTopic};

/// A final ranked document ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDocument {
    pub external_id: String,
    pub score: f64,
}

/// Everything produced for one query.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub query_id: String,
    pub query_terms: Vec<String>,
    pub feedback_docs: usize,
    pub model: RelevanceModel,
    pub results: Vec<RankedDocument>,
}

impl QueryOutcome {
    /// Write the ranking as run lines.
    pub fn write_to<W: Write>(&self, writer: &mut RunWriter<W>) -> Result<()> {
        writer.write_ranking(
            &self.query_id,
            self.results
                .iter()
                .map(|doc| (doc.external_id.as_str(), doc.score)),
        )
    }
}

/// A query that produced no output, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedQuery {
    pub query_id: String,
    pub reason: String,
}

/// Which queries of a batch were processed or skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_name: String,
    pub processed: Vec<String>,
    pub skipped: Vec<SkippedQuery>,
    pub lines_written: usize,
}

/// Runs relevance feedback with shared, read-only collaborators.
pub struct RelevanceFeedback<'a> {
    searcher: &'a dyn Searcher,
    vectors: &'a dyn DocumentVectorSource,
    stats: &'a dyn CollectionStatistics,
    analyzer: &'a dyn Analyzer,
    config: &'a RunConfig,
    initial: Option<&'a RunFile>,
    estimator: RelevanceModelEstimator,
}

impl<'a> RelevanceFeedback<'a> {
    /// `vectors` and `stats` must describe the feedback field.
    pub fn new(
        searcher: &'a dyn Searcher,
        vectors: &'a dyn DocumentVectorSource,
        stats: &'a dyn CollectionStatistics,
        analyzer: &'a dyn Analyzer,
        config: &'a RunConfig,
    ) -> Self {
        RelevanceFeedback {
            searcher,
            vectors,
            stats,
            analyzer,
            config,
            initial: None,
            estimator: RelevanceModelEstimator::new(config.feedback_params()),
        }
    }

    /// Take initial rankings from a loaded run file instead of searching.
    pub fn with_initial_ranking(mut self, run: &'a RunFile) -> Self {
        self.initial = Some(run);
        self
    }

    /// Analyzed terms of a topic's title.
    pub fn query_terms(&self, topic: &TrecTopic) -> Result<Vec<String>> {
        let terms = self.analyzer.analyze(&topic.title)?;
        if terms.is_empty() {
            return Err(RblmError::query(format!(
                "Query {} has no terms after analysis",
                topic.id
            )));
        }
        Ok(terms)
    }

    /// Initial ranking of a query, at most `num_hits` long.
    pub fn initial_hits(&self, query_id: &str, query_terms: &[String]) -> Result<Vec<Hit>> {
        let num_hits = self.config.num_hits;
        match self.initial {
            Some(run) => {
                let mut hits = Vec::new();
                for entry in run.ranking(query_id)? {
                    if hits.len() >= num_hits {
                        break;
                    }
                    match self.searcher.doc_id_for(&entry.doc_id) {
                        Some(doc_id) => hits.push(Hit::new(doc_id, entry.score)),
                        None => warn!(
                            "Query {query_id}: document '{}' is not in the index, skipped",
                            entry.doc_id
                        ),
                    }
                }
                Ok(hits)
            }
            None => {
                let query = BooleanQuery::from_terms(&self.config.field_to_search, query_terms)?;
                self.searcher.search(&query, num_hits)
            }
        }
    }

    /// Relevance model of a query from its initial ranking.
    pub fn estimate(&self, hits: &[Hit], query_terms: &[String]) -> Result<(RelevanceModel, usize)> {
        let feedback = FeedbackSet::build(
            hits,
            self.config.num_feedback_docs,
            self.vectors,
            query_terms,
            self.stats.vocabulary_size(),
            self.config.mixing_lambda,
        )?;
        let model = self.estimator.estimate(&feedback, query_terms)?;
        Ok((model, feedback.len()))
    }

    /// Run the full feedback loop for one topic.
    pub fn process_query(&self, topic: &TrecTopic) -> Result<QueryOutcome> {
        let query_terms = self.query_terms(topic)?;
        let hits = self.initial_hits(&topic.id, &query_terms)?;
        let (model, feedback_docs) = self.estimate(&hits, &query_terms)?;

        let results = if self.config.rerank {
            let reranker = Reranker::new(
                self.stats,
                self.vectors,
                self.searcher,
                self.config.mixing_lambda,
            );
            reranker
                .rerank(&hits, &model)?
                .into_iter()
                .map(|doc| RankedDocument {
                    score: doc.emitted_score(),
                    external_id: doc.external_id,
                })
                .collect()
        } else {
            let expanded = QueryExpander::new(&self.config.field_to_search).expand(&model)?;
            let mut results = Vec::new();
            for hit in self.searcher.search(&expanded, self.config.num_hits)? {
                match self.searcher.external_id(hit.doc_id) {
                    Some(external_id) => results.push(RankedDocument {
                        external_id: external_id.to_string(),
                        score: hit.score,
                    }),
                    None => warn!("Document {} has no external id, skipped", hit.doc_id),
                }
            }
            results
        };

        info!(
            "Query {}: {} hits, {} feedback docs, {} model terms, {} results",
            topic.id,
            hits.len(),
            feedback_docs,
            model.len(),
            results.len()
        );

        Ok(QueryOutcome {
            query_id: topic.id.clone(),
            query_terms,
            feedback_docs,
            model,
            results,
        })
    }

    /// Process every topic, in input order.
    ///
    /// Failures confined to one query are logged and reported; any other
    /// failure stops the batch.
    pub fn run_batch(&self, topics: &[TrecTopic]) -> Result<(Vec<QueryOutcome>, BatchReport)> {
        let results: Vec<Result<QueryOutcome>> = match self.config.threads {
            Some(threads) if threads > 1 => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("rblm-query-{i}"))
                    .build()
                    .map_err(|e| RblmError::internal(format!("Failed to create thread pool: {e}")))?;
                pool.install(|| topics.par_iter().map(|t| self.process_query(t)).collect())
            }
            _ => topics.iter().map(|t| self.process_query(t)).collect(),
        };

        let mut outcomes = Vec::with_capacity(topics.len());
        let mut report = BatchReport {
            run_name: self.config.effective_run_name(),
            ..BatchReport::default()
        };
        for (topic, result) in topics.iter().zip(results) {
            match result {
                Ok(outcome) => {
                    report.processed.push(topic.id.clone());
                    outcomes.push(outcome);
                }
                Err(e) if e.is_query_scoped() => {
                    warn!("Skipping query {}: {e}", topic.id);
                    report.skipped.push(SkippedQuery {
                        query_id: topic.id.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Processed {} queries, skipped {}",
            report.processed.len(),
            report.skipped.len()
        );

        Ok((outcomes, report))
    }

    /// Run a batch and write its run lines.
    pub fn run_to<W: Write>(&self, topics: &[TrecTopic], writer: W) -> Result<BatchReport> {
        let (outcomes, mut report) = self.run_batch(topics)?;
        let mut writer = RunWriter::new(writer, &report.run_name);
        for outcome in &outcomes {
            outcome.write_to(&mut writer)?;
        }
        report.lines_written = writer.lines();
        writer.finish()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::analysis::WhitespaceAnalyzer;
    use crate::index::{InMemoryIndex, IndexBuilder, SourceDocument};
    use crate::search::{IndexSearcher, Similarity};

    fn build_index() -> InMemoryIndex {
        let mut builder = IndexBuilder::new(
            Arc::new(WhitespaceAnalyzer::new()),
            vec!["content".to_string()],
        );
        let documents = vec![
            SourceDocument::new("D1").with_field("content", "cat cat dog purr"),
            SourceDocument::new("D2").with_field("content", "dog bark bone"),
            SourceDocument::new("D3").with_field("content", "cat purr whiskers milk"),
            SourceDocument::new("D4").with_field("content", "fish water fin"),
            SourceDocument::new("D5")
                .with_field("content", "cat nap")
                .without_vectors(),
        ];
        builder.add_documents(&documents).unwrap();
        builder.build()
    }

    fn config() -> RunConfig {
        RunConfig::new()
            .topics_path("topics.test")
            .num_hits(10)
            .num_feedback_docs(2)
            .num_feedback_terms(5)
            .query_mix(0.5)
            .mixing_lambda(0.5)
    }

    fn run(config: &RunConfig, topics: &[TrecTopic]) -> (Vec<QueryOutcome>, BatchReport) {
        let index = build_index();
        let field = index.field("content").unwrap();
        let searcher = IndexSearcher::new(&index, Similarity::default());
        let analyzer = WhitespaceAnalyzer::new();
        let engine = RelevanceFeedback::new(&searcher, field, field.stats(), &analyzer, config);
        engine.run_batch(topics).unwrap()
    }

    #[test]
    fn test_expansion_run() {
        let topics = vec![TrecTopic::new("1", "cat")];
        let (outcomes, report) = run(&config(), &topics);

        assert_eq!(report.processed, vec!["1".to_string()]);
        let outcome = &outcomes[0];
        assert_eq!(outcome.feedback_docs, 2);
        assert!((outcome.model.total_weight() - 1.0).abs() < 1e-6);
        assert!(outcome.model.contains("purr"));
        // expansion reaches a document without the query term
        assert!(outcome.results.iter().any(|d| d.external_id == "D2"));
    }

    #[test]
    fn test_rerank_run() {
        let topics = vec![TrecTopic::new("1", "cat")];
        let (outcomes, _) = run(&config().rerank(true), &topics);

        let results = &outcomes[0].results;
        // D5 has no term vector
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|d| d.external_id != "D5"));
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_query_term_outside_feedback_is_processed() {
        let topics = vec![TrecTopic::new("1", "cat zebra")];
        let (outcomes, report) = run(&config(), &topics);

        assert_eq!(report.processed, vec!["1".to_string()]);
        assert!(report.skipped.is_empty());
        let model = &outcomes[0].model;
        assert!((model.total_weight() - 1.0).abs() < 1e-6);
        assert!(model.contains("zebra"));
        assert!(!outcomes[0].results.is_empty());
    }

    #[test]
    fn test_empty_query_skipped() {
        let topics = vec![TrecTopic::new("1", "   "), TrecTopic::new("2", "dog")];
        let (outcomes, report) = run(&config(), &topics);

        assert_eq!(outcomes.len(), 1);
        assert_eq!(report.processed, vec!["2".to_string()]);
        assert_eq!(report.skipped[0].query_id, "1");
    }

    #[test]
    fn test_initial_ranking_from_run_file() {
        let index = build_index();
        let field = index.field("content").unwrap();
        let searcher = IndexSearcher::new(&index, Similarity::default());
        let analyzer = WhitespaceAnalyzer::new();
        let config = config().rerank(true);

        let mut run_file = RunFile::new();
        run_file.push("7", "D4", 3.0);
        run_file.push("7", "UNKNOWN", 2.0);
        run_file.push("7", "D2", 1.0);

        let engine = RelevanceFeedback::new(&searcher, field, field.stats(), &analyzer, &config)
            .with_initial_ranking(&run_file);
        let topics = vec![TrecTopic::new("7", "fish"), TrecTopic::new("8", "dog")];
        let (outcomes, report) = engine.run_batch(&topics).unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].results[0].external_id, "D4");
        assert_eq!(outcomes[0].results.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].reason.contains("8"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let topics = vec![
            TrecTopic::new("1", "cat"),
            TrecTopic::new("2", "dog"),
            TrecTopic::new("3", "fish"),
        ];
        let (sequential, _) = run(&config(), &topics);
        let (parallel, _) = run(&config().threads(3), &topics);

        let ids: Vec<&str> = parallel.iter().map(|o| o.query_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        for (a, b) in sequential.iter().zip(&parallel) {
            assert_eq!(a.results, b.results);
        }
    }
}
