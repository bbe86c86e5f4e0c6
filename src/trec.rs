//! TREC topic files and run files.

pub mod run;
pub mod topics;

pub use run::{RunEntry, RunFile, RunWriter, read_run};
pub use topics::{TrecTopic, parse_topics, read_topics};
