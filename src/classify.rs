//! Keyword-dictionary topic classification.
//!
//! The dictionary is external configuration: a versioned TOML file mapping
//! topic names to keyword/phrase lists, loaded once at startup into an
//! immutable [`TopicDictionary`]. Reloading means constructing a new instance;
//! nothing here mutates shared state.
//!
//! Matching is whole-word only — a keyword must never match as a substring of
//! an unrelated word ("ai" does not match inside "train"). Phrases match as
//! consecutive token sequences.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::error::{Error, Result};

/// Sentinel topic used when nothing clears the presence threshold, or when
/// the dictionary is unavailable.
pub const UNKNOWN_TOPIC: &str = "unknown";

#[derive(Debug, Deserialize)]
struct DictionaryFile {
    #[serde(default)]
    version: String,
    #[serde(default)]
    topics: BTreeMap<String, Vec<String>>,
}

/// Immutable, versioned topic → keyword mapping.
#[derive(Debug)]
pub struct TopicDictionary {
    version: String,
    /// Keywords pre-tokenized: each entry is a lowercase token sequence.
    topics: BTreeMap<String, Vec<Vec<String>>>,
}

impl TopicDictionary {
    /// Load a dictionary from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::DictionaryUnavailable(format!("{}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }

    /// Parse a dictionary from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: DictionaryFile = toml::from_str(contents)
            .map_err(|e| Error::DictionaryUnavailable(e.to_string()))?;

        let topics = file
            .topics
            .into_iter()
            .map(|(topic, keywords)| {
                let tokenized = keywords
                    .iter()
                    .map(|kw| tokenize(kw))
                    .filter(|toks| !toks.is_empty())
                    .collect();
                (topic, tokenized)
            })
            .collect();

        Ok(Self {
            version: file.version,
            topics,
        })
    }

    /// Dictionary version string, as declared in the file.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Configured topic names, in stable order.
    pub fn topic_names(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(|s| s.as_str())
    }
}

/// Scores free text against a topic dictionary.
///
/// Holds `None` when the dictionary could not be loaded, in which case every
/// classification degrades to `{"unknown": 1.0}` — degraded, never fatal.
#[derive(Clone)]
pub struct TopicClassifier {
    dictionary: Option<Arc<TopicDictionary>>,
    presence_threshold: f64,
}

impl TopicClassifier {
    pub fn new(dictionary: Arc<TopicDictionary>, presence_threshold: f64) -> Self {
        Self {
            dictionary: Some(dictionary),
            presence_threshold,
        }
    }

    /// Build a classifier with no dictionary. Everything classifies as unknown.
    pub fn degraded(reason: &str) -> Self {
        warn!(reason, "topic dictionary unavailable, classifying everything as unknown");
        Self {
            dictionary: None,
            presence_threshold: 0.0,
        }
    }

    /// Load the dictionary from a path, degrading on failure instead of erroring.
    pub fn from_path(path: impl AsRef<Path>, presence_threshold: f64) -> Self {
        match TopicDictionary::load(&path) {
            Ok(dict) => Self::new(Arc::new(dict), presence_threshold),
            Err(e) => Self::degraded(&e.to_string()),
        }
    }

    /// Version of the loaded dictionary, if any.
    pub fn dictionary_version(&self) -> Option<&str> {
        self.dictionary.as_deref().map(|d| d.version())
    }

    /// Score `text` against every configured topic.
    ///
    /// Per-topic score is keyword occurrences divided by the token count of
    /// `text`, capped at 1.0. Topics below the presence threshold are dropped;
    /// an empty result collapses to the `unknown` sentinel at 1.0.
    pub fn classify(&self, text: &str) -> BTreeMap<String, f64> {
        let Some(dictionary) = self.dictionary.as_deref() else {
            return unknown_result();
        };

        let tokens = tokenize(text);
        if tokens.is_empty() {
            return unknown_result();
        }

        let mut scores = BTreeMap::new();
        for (topic, keywords) in &dictionary.topics {
            let mut matches = 0usize;
            for keyword in keywords {
                matches += count_occurrences(&tokens, keyword);
            }
            if matches == 0 {
                continue;
            }
            let score = (matches as f64 / tokens.len() as f64).min(1.0);
            if score > self.presence_threshold {
                scores.insert(topic.clone(), score);
            }
        }

        if scores.is_empty() {
            return unknown_result();
        }
        scores
    }
}

fn unknown_result() -> BTreeMap<String, f64> {
    BTreeMap::from([(UNKNOWN_TOPIC.to_string(), 1.0)])
}

/// Lowercase word tokenization on non-alphanumeric boundaries.
///
/// Apostrophes are kept inside words so contractions stay single tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.trim_matches('\'').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Count non-overlapping occurrences of `keyword` (a token sequence) in `tokens`.
fn count_occurrences(tokens: &[String], keyword: &[String]) -> usize {
    if keyword.is_empty() || keyword.len() > tokens.len() {
        return 0;
    }
    let mut count = 0;
    let mut i = 0;
    while i + keyword.len() <= tokens.len() {
        if tokens[i..i + keyword.len()]
            .iter()
            .zip(keyword)
            .all(|(a, b)| a == b)
        {
            count += 1;
            i += keyword.len();
        } else {
            i += 1;
        }
    }
    count
}
