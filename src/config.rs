//! Run configuration.
//!
//! A [`RunConfig`] is usually read from a JSON file and then overridden
//! field by field from command line flags. Every field has a default, so a
//! partial file is valid.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::AnalyzerKind;
use crate::error::{RblmError, Result};
use crate::feedback::RelevanceModelParams;
use crate::search::Similarity;

fn default_field() -> String {
    "content".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_num_hits() -> usize {
    1000
}

fn default_num_feedback_docs() -> usize {
    10
}

fn default_num_feedback_terms() -> usize {
    50
}

fn default_mixing_lambda() -> f64 {
    0.8
}

fn default_query_mix() -> f64 {
    0.98
}

/// Parameters of one feedback run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub index_path: PathBuf,
    #[serde(default)]
    pub topics_path: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Must match the analyzer the index was built with.
    #[serde(default)]
    pub analyzer: AnalyzerKind,
    /// One stop word per line; the built-in English list when absent.
    #[serde(default)]
    pub stopwords_path: Option<PathBuf>,
    /// Field searched by the initial and expanded queries.
    #[serde(default = "default_field")]
    pub field_to_search: String,
    /// Field whose term vectors feed the relevance model.
    #[serde(default = "default_field")]
    pub field_for_feedback: String,
    #[serde(default)]
    pub similarity: Similarity,
    /// Hits retrieved per query, and lines written per query.
    #[serde(default = "default_num_hits")]
    pub num_hits: usize,
    #[serde(default = "default_num_feedback_docs")]
    pub num_feedback_docs: usize,
    #[serde(default = "default_num_feedback_terms")]
    pub num_feedback_terms: usize,
    /// Document weight of the smoothed estimates.
    #[serde(default = "default_mixing_lambda")]
    pub mixing_lambda: f64,
    /// Weight of the feedback distribution in RM3.
    #[serde(default = "default_query_mix")]
    pub query_mix: f64,
    /// Rerank the initial ranking instead of re-retrieving.
    #[serde(default)]
    pub rerank: bool,
    /// Take initial rankings from this run file instead of searching.
    #[serde(default)]
    pub feedback_file: Option<PathBuf>,
    #[serde(default)]
    pub run_name: Option<String>,
    /// Worker threads; queries run one after another when unset.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            index_path: PathBuf::new(),
            topics_path: PathBuf::new(),
            output_dir: default_output_dir(),
            analyzer: AnalyzerKind::default(),
            stopwords_path: None,
            field_to_search: default_field(),
            field_for_feedback: default_field(),
            similarity: Similarity::default(),
            num_hits: default_num_hits(),
            num_feedback_docs: default_num_feedback_docs(),
            num_feedback_terms: default_num_feedback_terms(),
            mixing_lambda: default_mixing_lambda(),
            query_mix: default_query_mix(),
            rerank: false,
            feedback_file: None,
            run_name: None,
            threads: None,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        RunConfig::default()
    }

    /// Load a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| RblmError::config(format!("{}: {e}", path.display())))
    }

    pub fn index_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.index_path = path.into();
        self
    }

    pub fn topics_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.topics_path = path.into();
        self
    }

    pub fn output_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn similarity(mut self, similarity: Similarity) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn num_hits(mut self, num_hits: usize) -> Self {
        self.num_hits = num_hits;
        self
    }

    pub fn num_feedback_docs(mut self, num_feedback_docs: usize) -> Self {
        self.num_feedback_docs = num_feedback_docs;
        self
    }

    pub fn num_feedback_terms(mut self, num_feedback_terms: usize) -> Self {
        self.num_feedback_terms = num_feedback_terms;
        self
    }

    pub fn mixing_lambda(mut self, lambda: f64) -> Self {
        self.mixing_lambda = lambda;
        self
    }

    pub fn query_mix(mut self, query_mix: f64) -> Self {
        self.query_mix = query_mix;
        self
    }

    pub fn rerank(mut self, rerank: bool) -> Self {
        self.rerank = rerank;
        self
    }

    pub fn feedback_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.feedback_file = Some(path.into());
        self
    }

    pub fn run_name<S: Into<String>>(mut self, name: S) -> Self {
        self.run_name = Some(name.into());
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.mixing_lambda) {
            return Err(RblmError::config(format!(
                "mixing_lambda must be in [0, 1], got {}",
                self.mixing_lambda
            )));
        }
        if !(0.0..=1.0).contains(&self.query_mix) {
            return Err(RblmError::config(format!(
                "query_mix must be in [0, 1], got {}",
                self.query_mix
            )));
        }
        if self.num_hits == 0 {
            return Err(RblmError::config("num_hits must be positive"));
        }
        if self.field_to_search.is_empty() || self.field_for_feedback.is_empty() {
            return Err(RblmError::config("field names must not be empty"));
        }
        if self.threads == Some(0) {
            return Err(RblmError::config("threads must be positive"));
        }
        self.similarity.validate()
    }

    /// RM3 parameters of this run.
    pub fn feedback_params(&self) -> RelevanceModelParams {
        RelevanceModelParams {
            num_feedback_terms: self.num_feedback_terms,
            query_mix: self.query_mix,
        }
    }

    /// The configured run name, or one derived from the parameters:
    /// `<topics>-<similarity>-D<docs>-T<terms>-rm3-<qmix>[-rerank]`.
    pub fn effective_run_name(&self) -> String {
        if let Some(name) = &self.run_name {
            return name.clone();
        }
        let topics = self
            .topics_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "topics".to_string());
        let mut name = format!(
            "{topics}-{}-D{}-T{}-rm3-{}",
            self.similarity.label(),
            self.num_feedback_docs,
            self.num_feedback_terms,
            self.query_mix
        );
        if self.rerank {
            name.push_str("-rerank");
        }
        name.retain(|c| !c.is_whitespace() && c != '(' && c != ')');
        name
    }

    /// Path of the run file inside `output_dir`.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.effective_run_name())
    }
}
