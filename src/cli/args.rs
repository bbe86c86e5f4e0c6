//! Command line argument parsing for the rblm CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::analysis::AnalyzerKind;
use crate::config::RunConfig;
use crate::search::Similarity;

/// rblm - relevance model (RM1/RM3) feedback runs for IR experiments
#[derive(Parser, Debug, Clone)]
#[command(name = "rblm")]
#[command(about = "Relevance-based language model feedback for TREC-style runs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct RblmArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl RblmArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build an index from a JSONL document collection
    Index(IndexArgs),

    /// Execute a feedback run over a topic file
    Run(RunArgs),

    /// Print the RM3 distribution of a single query
    Expand(ExpandArgs),

    /// Show collection statistics
    Stats(StatsArgs),
}

/// Arguments for building an index
#[derive(Parser, Debug, Clone)]
pub struct IndexArgs {
    /// JSONL file, one `{"docid": ..., "<field>": ...}` object per line
    #[arg(value_name = "DOCUMENTS")]
    pub documents: PathBuf,

    /// Path to the index directory
    #[arg(value_name = "INDEX_PATH")]
    pub index_path: PathBuf,

    /// Fields to index (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "content")]
    pub fields: Vec<String>,

    /// Text analyzer
    #[arg(long, default_value = "english")]
    pub analyzer: AnalyzerKind,

    /// Stop word file, one word per line
    #[arg(long, value_name = "FILE")]
    pub stopwords: Option<PathBuf>,

    /// Overwrite an existing index
    #[arg(long)]
    pub force: bool,
}

/// Options shared by `run` and `expand`; each one overrides the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct RunOptions {
    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the index directory
    #[arg(long, value_name = "INDEX_PATH")]
    pub index: Option<PathBuf>,

    /// Text analyzer (must match the index)
    #[arg(long)]
    pub analyzer: Option<AnalyzerKind>,

    /// Stop word file, one word per line
    #[arg(long, value_name = "FILE")]
    pub stopwords: Option<PathBuf>,

    /// Field searched by initial and expanded queries
    #[arg(long)]
    pub field: Option<String>,

    /// Field whose term vectors feed the relevance model
    #[arg(long)]
    pub feedback_field: Option<String>,

    /// Similarity for initial retrieval
    #[arg(long)]
    pub similarity: Option<SimilarityKind>,

    /// First similarity parameter (BM25 k1, LM-JM lambda, LM-Dirichlet mu)
    #[arg(long)]
    pub param1: Option<f64>,

    /// Second similarity parameter (BM25 b)
    #[arg(long)]
    pub param2: Option<f64>,

    /// Number of hits retrieved and written per query
    #[arg(short = 'n', long)]
    pub num_hits: Option<usize>,

    /// Number of feedback documents
    #[arg(short = 'd', long)]
    pub feedback_docs: Option<usize>,

    /// Number of feedback terms
    #[arg(short = 't', long)]
    pub feedback_terms: Option<usize>,

    /// Document weight of the smoothed estimates
    #[arg(long)]
    pub lambda: Option<f64>,

    /// Weight of the feedback model against the query (QMIX)
    #[arg(long)]
    pub qmix: Option<f64>,

    /// Initial rankings from a 6-column run file instead of searching
    #[arg(long, value_name = "FILE")]
    pub feedback_file: Option<PathBuf>,
}

impl RunOptions {
    /// Apply every given option on top of `config`.
    pub fn apply(&self, mut config: RunConfig) -> RunConfig {
        if let Some(index) = &self.index {
            config.index_path = index.clone();
        }
        if let Some(analyzer) = self.analyzer {
            config.analyzer = analyzer;
        }
        if let Some(stopwords) = &self.stopwords {
            config.stopwords_path = Some(stopwords.clone());
        }
        if let Some(field) = &self.field {
            config.field_to_search = field.clone();
        }
        if let Some(field) = &self.feedback_field {
            config.field_for_feedback = field.clone();
        }
        if let Some(kind) = self.similarity {
            config.similarity = kind.with_params(self.param1, self.param2);
        }
        if let Some(num_hits) = self.num_hits {
            config.num_hits = num_hits;
        }
        if let Some(docs) = self.feedback_docs {
            config.num_feedback_docs = docs;
        }
        if let Some(terms) = self.feedback_terms {
            config.num_feedback_terms = terms;
        }
        if let Some(lambda) = self.lambda {
            config.mixing_lambda = lambda;
        }
        if let Some(qmix) = self.qmix {
            config.query_mix = qmix;
        }
        if let Some(file) = &self.feedback_file {
            config.feedback_file = Some(file.clone());
        }
        config
    }
}

/// Arguments for a feedback run
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub options: RunOptions,

    /// TREC topic file
    #[arg(long, value_name = "FILE")]
    pub topics: Option<PathBuf>,

    /// Directory the run file is written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Rerank the initial ranking instead of re-retrieving
    #[arg(long)]
    pub rerank: bool,

    /// Run tag and output file name
    #[arg(long)]
    pub run_name: Option<String>,

    /// Worker threads (0 = one per CPU)
    #[arg(long)]
    pub threads: Option<usize>,
}

/// Arguments for printing one query's relevance model
#[derive(Parser, Debug, Clone)]
pub struct ExpandArgs {
    #[command(flatten)]
    pub options: RunOptions,

    /// Query text
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Query id used to look up the feedback file
    #[arg(long, default_value = "query")]
    pub query_id: String,
}

/// Arguments for collection statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Path to the index directory
    #[arg(value_name = "INDEX_PATH")]
    pub index_path: PathBuf,

    /// Only this field (default: all fields)
    #[arg(long)]
    pub field: Option<String>,

    /// Terms to look up (comma-separated, already analyzed)
    #[arg(long, value_delimiter = ',')]
    pub terms: Vec<String>,
}

/// Similarity names accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityKind {
    /// Classic TF-IDF
    Tfidf,
    /// Okapi BM25 (param1 = k1, param2 = b)
    Bm25,
    /// LM with Jelinek-Mercer smoothing (param1 = lambda)
    LmJm,
    /// LM with Dirichlet smoothing (param1 = mu)
    LmDir,
}

impl SimilarityKind {
    /// Build a similarity, falling back to defaults for missing parameters.
    pub fn with_params(self, param1: Option<f64>, param2: Option<f64>) -> Similarity {
        match self {
            SimilarityKind::Tfidf => Similarity::Tfidf,
            SimilarityKind::Bm25 => Similarity::Bm25 {
                k1: param1.unwrap_or(1.2),
                b: param2.unwrap_or(0.75),
            },
            SimilarityKind::LmJm => Similarity::LmJelinekMercer {
                lambda: param1.unwrap_or(0.7),
            },
            SimilarityKind::LmDir => Similarity::LmDirichlet {
                mu: param1.unwrap_or(2000.0),
            },
        }
    }
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_index_command() {
        let args = RblmArgs::try_parse_from([
            "rblm",
            "index",
            "docs.jsonl",
            "/path/to/index",
            "--fields",
            "content,title",
            "--force",
        ])
        .unwrap();

        if let Command::Index(index_args) = args.command {
            assert_eq!(index_args.documents, PathBuf::from("docs.jsonl"));
            assert_eq!(index_args.index_path, PathBuf::from("/path/to/index"));
            assert_eq!(index_args.fields, vec!["content", "title"]);
            assert_eq!(index_args.analyzer, AnalyzerKind::English);
            assert!(index_args.force);
        } else {
            panic!("Expected Index command");
        }
    }

    #[test]
    fn test_run_command() {
        let args = RblmArgs::try_parse_from([
            "rblm",
            "run",
            "--index",
            "idx",
            "--topics",
            "topics.301-350",
            "--similarity",
            "lm-dir",
            "--param1",
            "1000",
            "-d",
            "5",
            "-t",
            "20",
            "--qmix",
            "0.5",
            "--rerank",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.verbosity(), 2);

        if let Command::Run(run_args) = args.command {
            assert!(run_args.rerank);
            let config = run_args.options.apply(RunConfig::default());
            assert_eq!(config.index_path, PathBuf::from("idx"));
            assert_eq!(config.similarity, Similarity::LmDirichlet { mu: 1000.0 });
            assert_eq!(config.num_feedback_docs, 5);
            assert_eq!(config.num_feedback_terms, 20);
            assert_eq!(config.query_mix, 0.5);
            assert_eq!(config.num_hits, 1000);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_expand_command() {
        let args = RblmArgs::try_parse_from([
            "rblm",
            "expand",
            "international crime",
            "--index",
            "idx",
            "-f",
            "json",
            "--pretty",
        ])
        .unwrap();

        assert_eq!(args.output_format, OutputFormat::Json);
        assert!(args.pretty);
        if let Command::Expand(expand_args) = args.command {
            assert_eq!(expand_args.query, "international crime");
            assert_eq!(expand_args.query_id, "query");
        } else {
            panic!("Expected Expand command");
        }
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let args = RblmArgs::try_parse_from(["rblm", "-q", "-vvv", "stats", "idx"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_similarity_defaults() {
        assert_eq!(
            SimilarityKind::Bm25.with_params(Some(0.9), None),
            Similarity::Bm25 { k1: 0.9, b: 0.75 }
        );
        assert_eq!(SimilarityKind::Tfidf.with_params(Some(3.0), None), Similarity::Tfidf);
    }
}
