//! Criterion benchmarks for relevance model estimation and reranking.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rblm::analysis::WhitespaceAnalyzer;
use rblm::feedback::{FeedbackSet, RelevanceModelEstimator, RelevanceModelParams, Reranker};
use rblm::index::{CollectionStatistics, InMemoryIndex, IndexBuilder, SourceDocument};
use rblm::query::BooleanQuery;
use rblm::search::{IndexSearcher, Searcher, Similarity};

/// Generate test documents for benchmarking.
fn generate_test_documents(count: usize) -> Vec<SourceDocument> {
    let words = [
        "search", "engine", "full", "text", "index", "query", "document", "field", "term",
        "phrase", "boolean", "vector", "similarity", "relevance", "score", "analysis",
        "feedback", "model", "expansion", "rerank", "divergence", "smoothing", "corpus",
        "collection", "retrieval", "ranking", "topic", "judgment", "precision", "recall",
    ];

    (0..count)
        .map(|i| {
            let doc_length = 50 + (i % 100); // Variable length documents
            let text: Vec<&str> = (0..doc_length)
                .map(|j| words[(i * 7 + j * 13) % words.len()]) // Pseudo-random distribution
                .collect();
            SourceDocument::new(format!("DOC-{i}")).with_field("content", text.join(" "))
        })
        .collect()
}

fn build_index(count: usize) -> InMemoryIndex {
    let mut builder = IndexBuilder::new(
        Arc::new(WhitespaceAnalyzer::new()),
        vec!["content".to_string()],
    );
    builder
        .add_documents(&generate_test_documents(count))
        .unwrap();
    builder.build()
}

/// Benchmark RM1/RM3 estimation.
fn bench_estimation(c: &mut Criterion) {
    let mut group = c.benchmark_group("relevance_model");

    let index = build_index(2000);
    let field = index.field("content").unwrap();
    let searcher = IndexSearcher::new(&index, Similarity::default());
    let query_terms = vec!["relevance".to_string(), "feedback".to_string()];
    let hits = searcher
        .search(&BooleanQuery::from_terms("content", &query_terms).unwrap(), 1000)
        .unwrap();

    for num_feedback_docs in [10, 50] {
        group.throughput(Throughput::Elements(num_feedback_docs as u64));
        group.bench_function(format!("rm3_{num_feedback_docs}_docs"), |b| {
            let estimator = RelevanceModelEstimator::new(RelevanceModelParams {
                num_feedback_terms: 50,
                query_mix: 0.5,
            });
            b.iter(|| {
                let feedback = FeedbackSet::build(
                    black_box(&hits),
                    num_feedback_docs,
                    field,
                    &query_terms,
                    field.stats().vocabulary_size(),
                    0.8,
                )
                .unwrap();
                black_box(estimator.estimate(&feedback, &query_terms).unwrap())
            })
        });
    }

    group.finish();
}

/// Benchmark KL-divergence reranking of a full initial ranking.
fn bench_rerank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rerank");
    group.sample_size(20);

    let index = build_index(2000);
    let field = index.field("content").unwrap();
    let searcher = IndexSearcher::new(&index, Similarity::default());
    let query_terms = vec!["divergence".to_string(), "smoothing".to_string()];
    let hits = searcher
        .search(&BooleanQuery::from_terms("content", &query_terms).unwrap(), 1000)
        .unwrap();
    let feedback = FeedbackSet::build(
        &hits,
        10,
        field,
        &query_terms,
        field.stats().vocabulary_size(),
        0.8,
    )
    .unwrap();
    let model = RelevanceModelEstimator::default()
        .estimate(&feedback, &query_terms)
        .unwrap();

    group.throughput(Throughput::Elements(hits.len() as u64));
    group.bench_function("kl_rerank", |b| {
        let reranker = Reranker::new(field.stats(), field, &index, 0.8);
        b.iter(|| black_box(reranker.rerank(black_box(&hits), &model).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_estimation, bench_rerank);
criterion_main!(benches);
