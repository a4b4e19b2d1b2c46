use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MemoirConfig {
    pub subject: SubjectConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub topics: TopicsConfig,
    pub dedup: DedupConfig,
    pub confidence: ConfidenceConfig,
    pub search: SearchConfig,
    pub graph: GraphConfig,
    pub knowledge: KnowledgeConfig,
    pub log_level: String,
}

/// The single tracked individual all statements are about.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SubjectConfig {
    /// Stable identifier used to scope storage and locking.
    pub id: String,
    /// Display name substituted for "I" in the graph form.
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Base URL of the external embedding service.
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TopicsConfig {
    /// Path to the topic dictionary TOML file.
    pub dictionary_path: String,
    /// Minimum per-topic score for a topic to register at all.
    pub presence_threshold: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DedupConfig {
    /// Cosine similarity at or above which a candidate is a duplicate.
    pub similarity_threshold: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub classification_weight: f64,
    pub novelty_weight: f64,
    /// Distance from the nearest neighbor is capped here before normalizing.
    pub novelty_cap: f64,
    /// Flat penalty applied to agent-attributed (proxy) statements.
    pub proxy_penalty: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Content-similarity floor for inclusion (topic matches bypass it).
    pub similarity_threshold: f64,
    /// Score granted when the query is a substring of a topic label.
    pub partial_topic_score: f64,
    /// Weight of the topic score when combined with content similarity.
    pub topic_boost: f64,
    pub default_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GraphConfig {
    /// Base URL of the remote document/graph retrieval service.
    pub base_url: String,
    /// Response mode the service is queried with (service-defined).
    pub response_mode: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Per-backend timeout for routed knowledge queries.
    pub timeout_secs: u64,
    /// Queries at or below this word count auto-route to the local index.
    pub short_query_words: usize,
}

impl Default for MemoirConfig {
    fn default() -> Self {
        Self {
            subject: SubjectConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            topics: TopicsConfig::default(),
            dedup: DedupConfig::default(),
            confidence: ConfidenceConfig::default(),
            search: SearchConfig::default(),
            graph: GraphConfig::default(),
            knowledge: KnowledgeConfig::default(),
            log_level: "info".into(),
        }
    }
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            id: "default".into(),
            name: "Friend".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_memoir_dir()
            .join("memory.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".into(),
            model: "all-MiniLM-L6-v2".into(),
            timeout_secs: 30,
        }
    }
}

impl Default for TopicsConfig {
    fn default() -> Self {
        let dictionary_path = default_memoir_dir()
            .join("topics.toml")
            .to_string_lossy()
            .into_owned();
        Self {
            dictionary_path,
            presence_threshold: 0.1,
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
        }
    }
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            classification_weight: 0.6,
            novelty_weight: 0.4,
            novelty_cap: 0.5,
            proxy_penalty: 0.2,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.3,
            partial_topic_score: 0.8,
            topic_boost: 0.5,
            default_limit: 5,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9621".into(),
            response_mode: "hybrid".into(),
            timeout_secs: 60,
        }
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            short_query_words: 4,
        }
    }
}

/// Returns `~/.memoir/`
pub fn default_memoir_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".memoir")
}

/// Returns the default config file path: `~/.memoir/config.toml`
pub fn default_config_path() -> PathBuf {
    default_memoir_dir().join("config.toml")
}

impl MemoirConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MemoirConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (MEMOIR_DB, MEMOIR_SUBJECT,
    /// MEMOIR_SUBJECT_NAME, MEMOIR_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MEMOIR_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("MEMOIR_SUBJECT") {
            self.subject.id = val;
        }
        if let Ok(val) = std::env::var("MEMOIR_SUBJECT_NAME") {
            self.subject.name = val;
        }
        if let Ok(val) = std::env::var("MEMOIR_LOG_LEVEL") {
            self.log_level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Resolve the topic dictionary path, expanding `~` if needed.
    pub fn resolved_dictionary_path(&self) -> PathBuf {
        expand_tilde(&self.topics.dictionary_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MemoirConfig::default();
        assert_eq!(config.subject.id, "default");
        assert_eq!(config.log_level, "info");
        assert!((config.dedup.similarity_threshold - 0.8).abs() < f64::EPSILON);
        assert!((config.search.topic_boost - 0.5).abs() < f64::EPSILON);
        assert!((config.search.partial_topic_score - 0.8).abs() < f64::EPSILON);
        assert!(config.storage.db_path.ends_with("memory.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
log_level = "debug"

[subject]
id = "alice"
name = "Alice"

[storage]
db_path = "/tmp/test.db"

[search]
topic_boost = 0.7
"#;
        let config: MemoirConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.subject.name, "Alice");
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert!((config.search.topic_boost - 0.7).abs() < f64::EPSILON);
        // defaults still apply for unset fields
        assert!((config.search.similarity_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.knowledge.short_query_words, 4);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = MemoirConfig::default();
        std::env::set_var("MEMOIR_DB", "/tmp/override.db");
        std::env::set_var("MEMOIR_SUBJECT", "env-subject");
        std::env::set_var("MEMOIR_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.subject.id, "env-subject");
        assert_eq!(config.log_level, "trace");

        // Clean up
        std::env::remove_var("MEMOIR_DB");
        std::env::remove_var("MEMOIR_SUBJECT");
        std::env::remove_var("MEMOIR_LOG_LEVEL");
    }
}
