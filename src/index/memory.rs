//! In-memory inverted index with stored term vectors.
//!
//! Built once from a JSONL document collection, persisted with bincode and
//! reopened read-only for every run. Each indexed field keeps postings,
//! document lengths, term vectors and a [`TermStatistics`] snapshot.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::analysis::Analyzer;
use crate::error::{RblmError, Result};
use crate::index::stats::TermStatistics;
use crate::index::vector::{DocId, DocumentLookup, DocumentVector, DocumentVectorSource};

/// One entry of a posting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u64,
}

/// Index data of a single field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldIndex {
    /// Posting lists in ascending doc id order.
    postings: AHashMap<String, Vec<Posting>>,
    doc_lengths: Vec<u64>,
    vectors: Vec<Option<DocumentVector>>,
    stats: TermStatistics,
}

impl FieldIndex {
    /// Posting list of `term`, empty if the term is unknown.
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Token count of a document in this field.
    pub fn doc_length(&self, doc_id: DocId) -> u64 {
        self.doc_lengths.get(doc_id as usize).copied().unwrap_or(0)
    }

    /// Mean document length, 0 for an empty field.
    pub fn average_length(&self) -> f64 {
        if self.doc_lengths.is_empty() {
            return 0.0;
        }
        self.doc_lengths.iter().sum::<u64>() as f64 / self.doc_lengths.len() as f64
    }

    /// Term statistics of this field.
    pub fn stats(&self) -> &TermStatistics {
        &self.stats
    }

    /// Number of documents with a stored term vector.
    pub fn vector_count(&self) -> usize {
        self.vectors.iter().filter(|v| v.is_some()).count()
    }
}

impl DocumentVectorSource for FieldIndex {
    fn document_vector(&self, doc_id: DocId) -> Result<Option<DocumentVector>> {
        match self.vectors.get(doc_id as usize) {
            Some(vector) => Ok(vector.clone()),
            None => Err(RblmError::index(format!("Document id {doc_id} out of range"))),
        }
    }
}

/// Read-only in-memory index.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InMemoryIndex {
    external_ids: Vec<String>,
    id_lookup: AHashMap<String, DocId>,
    fields: AHashMap<String, FieldIndex>,
}

impl InMemoryIndex {
    /// File name of the persisted index inside the index directory.
    pub const FILE_NAME: &'static str = "index.bin";

    /// Index data of `name`.
    pub fn field(&self, name: &str) -> Result<&FieldIndex> {
        self.fields.get(name).ok_or_else(|| {
            RblmError::index(format!(
                "Field '{name}' is not indexed (available: {})",
                self.field_names().join(", ")
            ))
        })
    }

    /// Indexed field names, sorted.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of documents.
    pub fn doc_count(&self) -> usize {
        self.external_ids.len()
    }

    /// Persist into `dir`, returning the written file path.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(Self::FILE_NAME);

        let writer = BufWriter::new(File::create(&path)?);
        bincode::serialize_into(writer, self)?;
        info!("Saved index with {} documents to {}", self.doc_count(), path.display());

        Ok(path)
    }

    /// Open an index previously written by [`InMemoryIndex::save`].
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref().join(Self::FILE_NAME);
        if !path.is_file() {
            return Err(RblmError::index(format!("No index found at {}", path.display())));
        }

        let reader = BufReader::new(File::open(&path)?);
        let index: InMemoryIndex = bincode::deserialize_from(reader)?;
        info!(
            "Opened index {} ({} documents, fields: {})",
            path.display(),
            index.doc_count(),
            index.field_names().join(", ")
        );

        Ok(index)
    }
}

impl DocumentLookup for InMemoryIndex {
    fn external_id(&self, doc_id: DocId) -> Option<&str> {
        self.external_ids.get(doc_id as usize).map(String::as_str)
    }

    fn doc_id_for(&self, external_id: &str) -> Option<DocId> {
        self.id_lookup.get(external_id).copied()
    }
}

fn default_true() -> bool {
    true
}

/// A raw document as read from a JSONL collection file.
///
/// Every string-valued key other than `docid` is a candidate text field;
/// `"vectors": false` indexes the document without storing its term vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(alias = "id")]
    pub docid: String,
    #[serde(default = "default_true")]
    pub vectors: bool,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl SourceDocument {
    pub fn new<S: Into<String>>(docid: S) -> Self {
        SourceDocument {
            docid: docid.into(),
            vectors: true,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field<F: Into<String>, T: Into<String>>(mut self, field: F, text: T) -> Self {
        self.fields
            .insert(field.into(), serde_json::Value::String(text.into()));
        self
    }

    /// Do not store a term vector for this document.
    pub fn without_vectors(mut self) -> Self {
        self.vectors = false;
        self
    }

    /// Text of `field`, empty if missing or not a string.
    pub fn text(&self, field: &str) -> &str {
        self.fields
            .get(field)
            .and_then(serde_json::Value::as_str)
            .unwrap_or("")
    }

    /// Read a JSONL file, one document per non-empty line.
    pub fn read_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<SourceDocument>> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let mut documents = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let document = serde_json::from_str(&line).map_err(|e| {
                RblmError::parse(format!("{}:{}: {e}", path.display(), line_num + 1))
            })?;
            documents.push(document);
        }

        Ok(documents)
    }
}

/// Builds an [`InMemoryIndex`] document by document.
pub struct IndexBuilder {
    analyzer: Arc<dyn Analyzer>,
    field_names: Vec<String>,
    index: InMemoryIndex,
}

impl IndexBuilder {
    /// Create a builder indexing `fields` with `analyzer`.
    pub fn new(analyzer: Arc<dyn Analyzer>, fields: Vec<String>) -> Self {
        let mut index = InMemoryIndex::default();
        for field in &fields {
            index.fields.insert(field.clone(), FieldIndex::default());
        }

        IndexBuilder {
            analyzer,
            field_names: fields,
            index,
        }
    }

    /// Analyze and add one document, returning its internal id.
    pub fn add_document(&mut self, document: &SourceDocument) -> Result<DocId> {
        if self.index.id_lookup.contains_key(&document.docid) {
            return Err(RblmError::index(format!(
                "Duplicate document id '{}'",
                document.docid
            )));
        }

        let doc_id = self.index.external_ids.len() as DocId;
        for field in &self.field_names {
            let tokens = self.analyzer.analyze(document.text(field))?;
            let vector = DocumentVector::from_tokens(doc_id, &tokens);
            let field_index = self
                .index
                .fields
                .get_mut(field)
                .ok_or_else(|| RblmError::internal(format!("Field '{field}' missing")))?;

            for (term, tf) in vector.terms() {
                field_index
                    .postings
                    .entry(term.to_string())
                    .or_default()
                    .push(Posting {
                        doc_id,
                        term_freq: tf,
                    });
                field_index.stats.record(term, tf);
            }
            field_index.doc_lengths.push(vector.length());
            field_index.vectors.push(document.vectors.then_some(vector));
        }

        self.index.external_ids.push(document.docid.clone());
        self.index.id_lookup.insert(document.docid.clone(), doc_id);
        debug!("Indexed document '{}' as {doc_id}", document.docid);

        Ok(doc_id)
    }

    /// Add many documents.
    pub fn add_documents<'d, I>(&mut self, documents: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'d SourceDocument>,
    {
        let mut count = 0;
        for document in documents {
            self.add_document(document)?;
            count += 1;
        }
        Ok(count)
    }

    /// Finish the index.
    pub fn build(mut self) -> InMemoryIndex {
        let doc_count = self.index.external_ids.len() as u64;
        for field_index in self.index.fields.values_mut() {
            field_index.stats.set_document_count(doc_count);
        }
        self.index
    }
}
