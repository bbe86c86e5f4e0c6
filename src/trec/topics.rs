//! Parser for TREC-style topic files.
//!
//! ```text
//! <top>
//! <num> Number: 301
//! <title> International Organized Crime
//! <desc> Description:
//! Identify organizations that participate in international criminal activity.
//! <narr> Narrative:
//! A relevant document must as a minimum identify the organization ...
//! </top>
//! ```
//!
//! Closing tags for the inner fields are optional.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RblmError, Result};

static TOP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<top>(.*?)</top>").expect("valid topic pattern"));

static FIELD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(num|title|desc|narr)>").expect("valid field pattern")
});

static CLOSING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</(?:num|title|desc|narr)>").expect("valid closing pattern")
});

/// One information need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrecTopic {
    pub id: String,
    pub title: String,
    pub description: String,
    pub narrative: String,
}

impl TrecTopic {
    pub fn new<I: Into<String>, T: Into<String>>(id: I, title: T) -> Self {
        TrecTopic {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            narrative: String::new(),
        }
    }
}

/// Parse every `<top>` block of `text`.
pub fn parse_topics(text: &str) -> Result<Vec<TrecTopic>> {
    let mut topics = Vec::new();

    for block in TOP_PATTERN.captures_iter(text) {
        let body = &block[1];
        let mut topic = TrecTopic::new(String::new(), String::new());

        for (tag, value) in fields(body) {
            match tag.as_str() {
                "num" => topic.id = strip_label(&value, "Number:"),
                "title" => topic.title = strip_label(&value, "Topic:"),
                "desc" => topic.description = strip_label(&value, "Description:"),
                "narr" => topic.narrative = strip_label(&value, "Narrative:"),
                _ => {}
            }
        }

        if topic.id.is_empty() {
            return Err(RblmError::parse(format!(
                "Topic #{} has no <num> field",
                topics.len() + 1
            )));
        }
        topics.push(topic);
    }

    Ok(topics)
}

/// Read and parse a topic file.
pub fn read_topics<P: AsRef<Path>>(path: P) -> Result<Vec<TrecTopic>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let topics = parse_topics(&text)
        .map_err(|e| RblmError::parse(format!("{}: {e}", path.display())))?;
    if topics.is_empty() {
        return Err(RblmError::parse(format!(
            "{}: no <top> blocks found",
            path.display()
        )));
    }
    Ok(topics)
}

/// Split a topic body into `(tag, raw value)` pairs.
///
/// A value runs until the next opening field tag or the end of the body.
fn fields(body: &str) -> Vec<(String, String)> {
    let tags: Vec<_> = FIELD_PATTERN.captures_iter(body).collect();
    let mut result = Vec::with_capacity(tags.len());

    for (i, caps) in tags.iter().enumerate() {
        let (Some(whole), Some(tag)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = tags
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(body.len());
        let value = CLOSING_PATTERN.replace_all(&body[whole.end()..end], " ");
        result.push((tag.as_str().to_lowercase(), value.into_owned()));
    }

    result
}

fn strip_label(value: &str, label: &str) -> String {
    let trimmed = value.trim();
    let trimmed = match trimmed.get(..label.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(label) => &trimmed[label.len()..],
        _ => trimmed,
    };
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}
