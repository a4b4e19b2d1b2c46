#![allow(dead_code)]

//! Shared test fixtures: deterministic fake embedder, scriptable fake graph
//! backend, and a store builder over an in-memory database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use memoir::classify::{TopicClassifier, TopicDictionary};
use memoir::config::MemoirConfig;
use memoir::db;
use memoir::embedding::{EmbeddingProvider, EMBEDDING_DIM};
use memoir::error::{Error, Result};
use memoir::graph::GraphStore;
use memoir::knowledge::{Backend, KnowledgeBackend};
use memoir::memory::store::MemoryStore;
use memoir::memory::types::Subject;

pub const TEST_DICT: &str = r#"
version = "test-dict-1"

[topics]
outdoors = ["hiking", "camping", "trail running"]
food = ["pizza", "sushi", "cooking"]
science = ["astronomy", "physics", "gravity"]
"#;

/// Deterministic embedder: explicit vectors per text, otherwise each new text
/// gets the next unit dimension (distinct texts are orthogonal).
pub struct FakeEmbedder {
    vectors: Mutex<HashMap<String, Vec<f32>>>,
    next_dim: Mutex<usize>,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self {
            vectors: Mutex::new(HashMap::new()),
            // Leave low dimensions free for hand-built vectors
            next_dim: Mutex::new(100),
        }
    }

    /// Pin the vector returned for a given text.
    pub fn set(&self, text: &str, vector: Vec<f32>) {
        self.vectors.lock().unwrap().insert(text.to_string(), vector);
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.vectors.lock().unwrap();
        if let Some(v) = vectors.get(text) {
            return Ok(v.clone());
        }
        let mut next = self.next_dim.lock().unwrap();
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        v[*next] = 1.0;
        *next += 1;
        vectors.insert(text.to_string(), v.clone());
        Ok(v)
    }
}

/// A unit vector along one dimension.
pub fn unit(dim: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    v[dim] = 1.0;
    v
}

/// A unit vector with the given cosine similarity against `unit(0)`.
pub fn with_cosine(cos: f32) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    v[0] = cos;
    v[1] = (1.0 - cos * cos).sqrt();
    v
}

/// How the fake graph behaves for queries.
pub enum GraphBehavior {
    /// Answer every query with this text.
    Answer(String),
    /// Fail immediately.
    Fail,
    /// Sleep long enough to trip any sane test timeout.
    Hang,
}

/// Scriptable graph backend recording inserts and deletes.
pub struct FakeGraph {
    pub behavior: GraphBehavior,
    pub fail_inserts: bool,
    pub inserts: Mutex<Vec<(String, String)>>,
    pub deletes: Mutex<Vec<String>>,
    pub cleared: Mutex<bool>,
}

impl FakeGraph {
    pub fn new(behavior: GraphBehavior) -> Self {
        Self {
            behavior,
            fail_inserts: false,
            inserts: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            cleared: Mutex::new(false),
        }
    }

    pub fn failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }
}

#[async_trait]
impl GraphStore for FakeGraph {
    async fn insert(&self, id: &str, text: &str) -> Result<()> {
        if self.fail_inserts {
            return Err(Error::backend(Backend::Graph, "connection refused"));
        }
        self.inserts
            .lock()
            .unwrap()
            .push((id.to_string(), text.to_string()));
        Ok(())
    }

    async fn query(&self, _query: &str) -> Result<String> {
        match &self.behavior {
            GraphBehavior::Answer(text) => Ok(text.clone()),
            GraphBehavior::Fail => Err(Error::backend(Backend::Graph, "connection refused")),
            GraphBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("hung backend should be timed out")
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.deletes.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.cleared.lock().unwrap() = true;
        Ok(())
    }
}

#[async_trait]
impl KnowledgeBackend for FakeGraph {
    async fn answer(&self, query: &str) -> Result<String> {
        self.query(query).await
    }
}

/// Config with test-friendly knobs; callers adjust further as needed.
pub fn test_config() -> MemoirConfig {
    MemoirConfig::default()
}

/// Build a store over an in-memory database for subject "alice"/"Alice".
pub fn build_store(
    embedder: Arc<FakeEmbedder>,
    graph: Arc<FakeGraph>,
    config: &MemoirConfig,
) -> MemoryStore {
    let conn = Arc::new(Mutex::new(db::open_memory_database().unwrap()));
    build_store_for(conn, embedder, graph, Subject::new("alice", "Alice"), config)
}

/// Build a store over a shared database for an explicit subject.
pub fn build_store_for(
    db: Arc<Mutex<rusqlite::Connection>>,
    embedder: Arc<FakeEmbedder>,
    graph: Arc<FakeGraph>,
    subject: Subject,
    config: &MemoirConfig,
) -> MemoryStore {
    let dict = TopicDictionary::from_toml(TEST_DICT).unwrap();
    MemoryStore::new(
        db,
        embedder,
        graph,
        TopicClassifier::new(Arc::new(dict), 0.05),
        subject,
        config,
    )
}
