//! Command implementations for the rblm CLI.

use std::fs::{self, File};
use std::io::BufWriter;
use std::time::Instant;

use anyhow::Context;
use log::info;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::RunConfig;
use crate::error::{RblmError, Result};
use crate::index::{CollectionStatistics, InMemoryIndex, IndexBuilder, SourceDocument};
use crate::pipeline::RelevanceFeedback;
use crate::search::IndexSearcher;
use crate::trec::{RunFile, TrecTopic, read_run, read_topics};

/// Execute a CLI command.
pub fn execute_command(args: RblmArgs) -> Result<()> {
    match &args.command {
        Command::Index(index_args) => build_index(index_args, &args),
        Command::Run(run_args) => run_feedback(run_args, &args),
        Command::Expand(expand_args) => expand_query(expand_args, &args),
        Command::Stats(stats_args) => show_stats(stats_args, &args),
    }
}

/// Build and save an index.
fn build_index(args: &IndexArgs, cli_args: &RblmArgs) -> Result<()> {
    let start_time = Instant::now();
    let index_file = args.index_path.join(InMemoryIndex::FILE_NAME);
    if index_file.exists() && !args.force {
        return Err(RblmError::index(format!(
            "{} already exists. Use --force to overwrite.",
            index_file.display()
        )));
    }

    let analyzer = args.analyzer.build(args.stopwords.as_deref())?;
    let documents = SourceDocument::read_jsonl(&args.documents)
        .with_context(|| format!("reading documents from {}", args.documents.display()))?;
    info!("Read {} documents", documents.len());

    let mut builder = IndexBuilder::new(analyzer, args.fields.clone());
    let count = builder.add_documents(&documents)?;
    let index = builder.build();
    index.save(&args.index_path)?;

    output_result(
        "Index built successfully",
        &IndexCreationResult {
            path: args.index_path.to_string_lossy().to_string(),
            documents: count,
            fields: args.fields.clone(),
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Configuration file (if any) overridden by command line options.
fn load_config(options: &RunOptions) -> Result<RunConfig> {
    let config = match &options.config {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => RunConfig::default(),
    };
    Ok(options.apply(config))
}

fn open_index(config: &RunConfig) -> Result<InMemoryIndex> {
    if config.index_path.as_os_str().is_empty() {
        return Err(RblmError::config("No index given (use --index or index_path)"));
    }
    let index = InMemoryIndex::open(&config.index_path)
        .with_context(|| format!("opening index {}", config.index_path.display()))?;
    index.field(&config.field_to_search)?;
    index.field(&config.field_for_feedback)?;
    Ok(index)
}

fn load_initial_ranking(config: &RunConfig) -> Result<Option<RunFile>> {
    match &config.feedback_file {
        Some(path) => {
            let run = read_run(path)
                .with_context(|| format!("reading feedback file {}", path.display()))?;
            info!("Loaded initial rankings for {} queries", run.len());
            Ok(Some(run))
        }
        None => Ok(None),
    }
}

/// Execute a feedback run and write the run file.
fn run_feedback(args: &RunArgs, cli_args: &RblmArgs) -> Result<()> {
    let start_time = Instant::now();
    let mut config = load_config(&args.options)?;
    if let Some(topics) = &args.topics {
        config.topics_path = topics.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if args.rerank {
        config.rerank = true;
    }
    if let Some(run_name) = &args.run_name {
        config.run_name = Some(run_name.clone());
    }
    if let Some(threads) = args.threads {
        config.threads = Some(if threads == 0 { num_cpus::get() } else { threads });
    }
    config.validate()?;

    if config.topics_path.as_os_str().is_empty() {
        return Err(RblmError::config("No topic file given (use --topics or topics_path)"));
    }
    let index = open_index(&config)?;
    let topics = read_topics(&config.topics_path)
        .with_context(|| format!("reading topics {}", config.topics_path.display()))?;
    let analyzer = config.analyzer.build(config.stopwords_path.as_deref())?;
    let initial = load_initial_ranking(&config)?;

    let feedback_field = index.field(&config.field_for_feedback)?;
    let searcher = IndexSearcher::new(&index, config.similarity);
    let mut engine = RelevanceFeedback::new(
        &searcher,
        feedback_field,
        feedback_field.stats(),
        analyzer.as_ref(),
        &config,
    );
    if let Some(run) = &initial {
        engine = engine.with_initial_ranking(run);
    }

    fs::create_dir_all(&config.output_dir)?;
    let output_path = config.output_path();
    info!(
        "Running {} topics with {} into {}",
        topics.len(),
        config.similarity,
        output_path.display()
    );
    let writer = BufWriter::new(File::create(&output_path)?);
    let report = engine.run_to(&topics, writer)?;

    output_result(
        "Run finished",
        &RunResult {
            output_path,
            report,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Estimate and print the relevance model of one query.
fn expand_query(args: &ExpandArgs, cli_args: &RblmArgs) -> Result<()> {
    let config = load_config(&args.options)?;
    config.validate()?;

    let index = open_index(&config)?;
    let analyzer = config.analyzer.build(config.stopwords_path.as_deref())?;
    let initial = load_initial_ranking(&config)?;

    let feedback_field = index.field(&config.field_for_feedback)?;
    let searcher = IndexSearcher::new(&index, config.similarity);
    let mut engine = RelevanceFeedback::new(
        &searcher,
        feedback_field,
        feedback_field.stats(),
        analyzer.as_ref(),
        &config,
    );
    if let Some(run) = &initial {
        engine = engine.with_initial_ranking(run);
    }

    let topic = TrecTopic::new(args.query_id.clone(), args.query.clone());
    let query_terms = engine.query_terms(&topic)?;
    let hits = engine.initial_hits(&topic.id, &query_terms)?;
    let (model, feedback_docs) = engine.estimate(&hits, &query_terms)?;

    output_result(
        &format!("Relevance model ({} terms)", model.len()),
        &ModelReport {
            query_id: topic.id,
            query_terms,
            feedback_docs,
            terms: model.into_entries(),
        },
        cli_args,
    )
}

/// Show collection statistics.
fn show_stats(args: &StatsArgs, cli_args: &RblmArgs) -> Result<()> {
    let index = InMemoryIndex::open(&args.index_path)
        .with_context(|| format!("opening index {}", args.index_path.display()))?;

    let field_names: Vec<String> = match &args.field {
        Some(field) => vec![field.clone()],
        None => index.field_names().into_iter().map(str::to_string).collect(),
    };

    let mut fields = Vec::with_capacity(field_names.len());
    let mut terms = Vec::new();
    for name in &field_names {
        let field = index.field(name)?;
        fields.push(field.stats().summary(name));
        for term in &args.terms {
            terms.push(TermLookup {
                field: name.clone(),
                term: term.clone(),
                stat: field.stats().term_stat(term),
            });
        }
    }

    output_result(
        "Collection statistics",
        &IndexStats {
            total_documents: index.doc_count(),
            fields,
            terms,
        },
        cli_args,
    )
}
