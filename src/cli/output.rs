//! Output formatting for CLI commands.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, RblmArgs};
use crate::error::Result;
use crate::feedback::WordProbability;
use crate::index::{CollectionSummary, TermStat};
use crate::pipeline::BatchReport;

/// A command result that can be printed for people as well as serialized.
pub trait HumanOutput: Serialize {
    fn print_human(&self);
}

/// Result structure for index building.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexCreationResult {
    pub path: String,
    pub documents: usize,
    pub fields: Vec<String>,
    pub duration_ms: u64,
}

/// Result structure for a feedback run.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunResult {
    pub output_path: PathBuf,
    #[serde(flatten)]
    pub report: BatchReport,
    pub duration_ms: u64,
}

/// Relevance model of a single query.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelReport {
    pub query_id: String,
    pub query_terms: Vec<String>,
    pub feedback_docs: usize,
    pub terms: Vec<WordProbability>,
}

/// Collection statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub fields: Vec<CollectionSummary>,
    pub terms: Vec<TermLookup>,
}

/// Statistics of one requested term in one field.
#[derive(Debug, Serialize, Deserialize)]
pub struct TermLookup {
    pub field: String,
    pub term: String,
    pub stat: Option<TermStat>,
}

/// Output a result in the specified format.
pub fn output_result<T: HumanOutput>(message: &str, result: &T, args: &RblmArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                println!("{message}");
                println!();
            }
            result.print_human();
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &RblmArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

impl HumanOutput for IndexCreationResult {
    fn print_human(&self) {
        println!("Index: {}", self.path);
        println!("Documents: {}", self.documents);
        println!("Fields: {}", self.fields.join(", "));
        println!("Time: {}ms", self.duration_ms);
    }
}

impl HumanOutput for RunResult {
    fn print_human(&self) {
        println!("Run: {}", self.report.run_name);
        println!("═══════════════");
        println!("Output: {}", self.output_path.display());
        println!("Queries processed: {}", self.report.processed.len());
        println!("Lines written: {}", self.report.lines_written);

        if !self.report.skipped.is_empty() {
            println!();
            println!("Skipped queries:");
            println!("────────────────");
            for skipped in &self.report.skipped {
                println!("  {}: {}", skipped.query_id, skipped.reason);
            }
        }

        println!();
        println!("Run time: {}ms", self.duration_ms);
    }
}

impl HumanOutput for ModelReport {
    fn print_human(&self) {
        println!("Query {}: {}", self.query_id, self.query_terms.join(" "));
        println!("Feedback documents: {}", self.feedback_docs);
        println!();
        println!("{:<6} {:<24} {:>10}", "Rank", "Term", "Weight");
        println!("──────────────────────────────────────────");
        for (i, entry) in self.terms.iter().enumerate() {
            println!("{:<6} {:<24} {:>10.6}", i + 1, entry.term, entry.weight);
        }
    }
}

impl HumanOutput for IndexStats {
    fn print_human(&self) {
        println!("Index Statistics:");
        println!("════════════════");
        println!("Total documents: {}", self.total_documents);

        for field in &self.fields {
            println!();
            println!("Field: {}", field.field);
            println!("  Tokens: {}", field.vocabulary_size);
            println!("  Unique terms: {}", field.unique_terms);
            println!("  Average length: {:.1}", field.average_document_length);
        }

        if !self.terms.is_empty() {
            println!();
            println!("Terms:");
            println!("──────");
            for lookup in &self.terms {
                match &lookup.stat {
                    Some(stat) => println!(
                        "  {}:{}  cf={} df={} idf={:.4}",
                        lookup.field, lookup.term, stat.corpus_freq, stat.doc_freq, stat.idf
                    ),
                    None => println!("  {}:{}  (not in collection)", lookup.field, lookup.term),
                }
            }
        }
    }
}
