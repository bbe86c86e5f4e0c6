//! Six-column TREC run files.
//!
//! Every line is `qid Q0 docid rank score tag`. Lines are written
//! tab-separated; any whitespace is accepted when reading.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{RblmError, Result};

/// Columns per run line.
pub const RUN_COLUMNS: usize = 6;

/// One ranked document of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    pub doc_id: String,
    pub score: f64,
}

/// A run file grouped by query id, each ranking in file order.
#[derive(Debug, Clone, Default)]
pub struct RunFile {
    rankings: AHashMap<String, Vec<RunEntry>>,
    query_order: Vec<String>,
}

impl RunFile {
    pub fn new() -> Self {
        RunFile::default()
    }

    /// Parse run lines from a reader; `source` names it in error messages.
    pub fn from_reader<R: BufRead>(reader: R, source: &str) -> Result<Self> {
        let mut run = RunFile::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() != RUN_COLUMNS {
                return Err(RblmError::parse(format!(
                    "{source}:{}: expected {RUN_COLUMNS} columns, found {}",
                    line_num + 1,
                    columns.len()
                )));
            }
            let score: f64 = columns[4].parse().map_err(|_| {
                RblmError::parse(format!(
                    "{source}:{}: invalid score '{}'",
                    line_num + 1,
                    columns[4]
                ))
            })?;
            run.push(columns[0], columns[2], score);
        }
        Ok(run)
    }

    /// Append a ranked document to the ranking of `query_id`.
    pub fn push<Q: Into<String>, D: Into<String>>(&mut self, query_id: Q, doc_id: D, score: f64) {
        let query_id = query_id.into();
        let entry = RunEntry {
            doc_id: doc_id.into(),
            score,
        };
        match self.rankings.get_mut(&query_id) {
            Some(ranking) => ranking.push(entry),
            None => {
                self.query_order.push(query_id.clone());
                self.rankings.insert(query_id, vec![entry]);
            }
        }
    }

    /// Ranking of `query_id`.
    pub fn ranking(&self, query_id: &str) -> Result<&[RunEntry]> {
        self.rankings
            .get(query_id)
            .map(Vec::as_slice)
            .ok_or_else(|| RblmError::query_not_found(query_id))
    }

    /// Query ids in order of first appearance.
    pub fn query_ids(&self) -> &[String] {
        &self.query_order
    }

    pub fn len(&self) -> usize {
        self.query_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.query_order.is_empty()
    }
}

/// Read a run file from disk.
pub fn read_run<P: AsRef<Path>>(path: P) -> Result<RunFile> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    RunFile::from_reader(reader, &path.display().to_string())
}

/// Writes run lines for one run tag.
pub struct RunWriter<W: Write> {
    writer: W,
    tag: String,
    lines: usize,
}

impl<W: Write> RunWriter<W> {
    pub fn new<S: Into<String>>(writer: W, tag: S) -> Self {
        RunWriter {
            writer,
            tag: tag.into(),
            lines: 0,
        }
    }

    /// Write one query's ranking; ranks start at 0.
    pub fn write_ranking<'r, I>(&mut self, query_id: &str, ranking: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'r str, f64)>,
    {
        for (rank, (doc_id, score)) in ranking.into_iter().enumerate() {
            writeln!(
                self.writer,
                "{query_id}\tQ0\t{doc_id}\t{rank}\t{score}\t{}",
                self.tag
            )?;
            self.lines += 1;
        }
        Ok(())
    }

    /// Lines written so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
