//! The memory store — subject-scoped orchestration of the write and read paths.
//!
//! [`MemoryStore`] wires the classifier, dedup engine, confidence scorer, and
//! restatement transform around the persistence boundary: the local SQLite
//! index and the remote graph service. Writes are mirrored best-effort to both
//! backends; the dedup check and the local write are one atomic unit per
//! subject, guarded by the per-subject write lock.

use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::classify::TopicClassifier;
use crate::config::{ConfidenceConfig, MemoirConfig};
use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::graph::GraphStore;
use crate::knowledge::{Backend, KnowledgeBackend};
use crate::memory::search::RankingParams;
use crate::memory::types::{
    BackendWrites, MemoryRecord, SearchHit, StoreOptions, StoreOutcome, Subject,
};
use crate::memory::{confidence, dedup, embedding_to_bytes, forget, normalize_text, search};
use crate::restate::restate;

/// Per-subject store handle. All operations are scoped to the subject given
/// at construction — there is no process-wide current subject.
pub struct MemoryStore {
    db: Arc<Mutex<Connection>>,
    embedder: Arc<dyn EmbeddingProvider>,
    graph: Arc<dyn GraphStore>,
    classifier: TopicClassifier,
    subject: Subject,
    dedup_threshold: f64,
    confidence_config: ConfidenceConfig,
    ranking: RankingParams,
    default_limit: usize,
    /// Serializes the dedup check + write per subject so concurrent identical
    /// stores cannot both pass the gate.
    write_lock: tokio::sync::Mutex<()>,
}

/// Aggregate counts over a subject's stored statements.
#[derive(Debug, serde::Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub proxy_count: usize,
    pub topics: BTreeMap<String, usize>,
}

impl MemoryStore {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        embedder: Arc<dyn EmbeddingProvider>,
        graph: Arc<dyn GraphStore>,
        classifier: TopicClassifier,
        subject: Subject,
        config: &MemoirConfig,
    ) -> Self {
        Self {
            db,
            embedder,
            graph,
            classifier,
            subject,
            dedup_threshold: config.dedup.similarity_threshold,
            confidence_config: config.confidence.clone(),
            ranking: RankingParams {
                similarity_threshold: config.search.similarity_threshold,
                partial_topic_score: config.search.partial_topic_score,
                topic_boost: config.search.topic_boost,
            },
            default_limit: config.search.default_limit,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Accept path: validate → dedup gate → classify/score → restate →
    /// mirrored writes.
    pub async fn store(&self, raw_text: &str, options: StoreOptions) -> Result<StoreOutcome> {
        let text = raw_text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("empty or whitespace-only text".into()));
        }
        if options.is_proxy && options.proxy_source.is_none() {
            return Err(Error::InvalidInput(
                "proxy statements require a proxy_source".into(),
            ));
        }

        let _guard = self.write_lock.lock().await;

        let embedding = self.embedder.embed(text).await?;
        let classification = self.classifier.classify(text);

        let decision = {
            let conn = self.db.lock().expect("database mutex poisoned");
            dedup::check(&conn, &self.subject.id, text, &embedding, self.dedup_threshold)?
        };
        let nearest_similarity = match decision {
            dedup::DedupDecision::Duplicate {
                existing_id,
                similarity,
            } => {
                info!(%existing_id, similarity, "rejected duplicate statement");
                return Ok(StoreOutcome::Duplicate {
                    existing_id,
                    similarity,
                });
            }
            dedup::DedupDecision::Accept { nearest_similarity } => nearest_similarity,
        };

        let confidence = confidence::score(
            &classification,
            nearest_similarity,
            options.is_proxy,
            &self.confidence_config,
        );

        // An explicit topic override replaces the classified label set.
        let topics: Vec<String> = match options.topics.filter(|t| !t.is_empty()) {
            Some(labels) => labels,
            None => classification.keys().cloned().collect(),
        };

        let (local_form, graph_form) = restate(text, &self.subject.name);

        let record = MemoryRecord {
            id: uuid::Uuid::now_v7().to_string(),
            subject_id: self.subject.id.clone(),
            raw_text: text.to_string(),
            local_form,
            graph_form,
            topics,
            confidence,
            is_proxy: options.is_proxy,
            proxy_source: options.proxy_source,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        // Mirrored writes: each backend independently, neither rolls back the
        // other. The caller learns which succeeded.
        let local_result = {
            let mut conn = self.db.lock().expect("database mutex poisoned");
            write_local(&mut conn, &record, &embedding)
        };
        if let Err(e) = &local_result {
            warn!(error = %e, "local index write failed");
        }

        let graph_result = self.graph.insert(&record.id, &record.graph_form).await;
        if let Err(e) = &graph_result {
            warn!(error = %e, "graph service write failed");
        }

        if local_result.is_err() && graph_result.is_err() {
            return Err(Error::AllBackendsFailed {
                local: local_result.unwrap_err().to_string(),
                graph: graph_result.unwrap_err().to_string(),
            });
        }

        let backends = BackendWrites {
            local: local_result.is_ok(),
            graph: graph_result.is_ok(),
        };
        info!(id = %record.id, topics = ?record.topics, confidence = record.confidence,
            local = backends.local, graph = backends.graph, "stored statement");

        Ok(StoreOutcome::Stored { record, backends })
    }

    /// Combined content + topic ranked search over the subject's statements.
    pub async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
        similarity_threshold: Option<f64>,
    ) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("empty query".into()));
        }

        let embedding = self.embedder.embed(query).await?;
        let mut ranking = self.ranking;
        if let Some(threshold) = similarity_threshold {
            ranking.similarity_threshold = threshold;
        }

        let conn = self.db.lock().expect("database mutex poisoned");
        search::search(
            &conn,
            &self.subject.id,
            query,
            &embedding,
            limit.unwrap_or(self.default_limit),
            ranking,
        )
    }

    /// Delete by id, topic, or everything. Returns the number of records
    /// removed locally; graph deletes are mirrored best-effort.
    pub async fn forget(&self, target: forget::ForgetTarget) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let removed = {
            let mut conn = self.db.lock().expect("database mutex poisoned");
            forget::forget(&mut conn, &self.subject.id, &target)?
        };

        match &target {
            forget::ForgetTarget::All => {
                if let Err(e) = self.graph.clear().await {
                    warn!(error = %e, "graph clear failed");
                }
            }
            _ => {
                for id in &removed {
                    if let Err(e) = self.graph.delete(id).await {
                        warn!(id = %id, error = %e, "graph delete failed");
                    }
                }
            }
        }

        Ok(removed.len())
    }

    /// Update = delete + recreate, so the replacement passes the dedup gate
    /// against the remaining records.
    pub async fn update(
        &self,
        id: &str,
        new_raw_text: &str,
        options: StoreOptions,
    ) -> Result<StoreOutcome> {
        let removed = self.forget(forget::ForgetTarget::Id(id.to_string())).await?;
        if removed == 0 {
            return Err(Error::InvalidInput(format!("no such record: {id}")));
        }
        self.store(new_raw_text, options).await
    }

    /// Fetch a single record by id.
    pub fn record(&self, id: &str) -> Result<Option<MemoryRecord>> {
        let conn = self.db.lock().expect("database mutex poisoned");
        search::fetch_record(&conn, &self.subject.id, id)
    }

    /// Aggregate counts for the subject.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.db.lock().expect("database mutex poisoned");
        let records = search::fetch_subject_records(&conn, &self.subject.id)?;

        let mut topics: BTreeMap<String, usize> = BTreeMap::new();
        let mut proxy_count = 0;
        for record in &records {
            if record.is_proxy {
                proxy_count += 1;
            }
            for topic in &record.topics {
                *topics.entry(topic.clone()).or_insert(0) += 1;
            }
        }

        Ok(StoreStats {
            total: records.len(),
            proxy_count,
            topics,
        })
    }
}

/// The local index doubles as a knowledge backend: the top-ranked local forms
/// are the answer. No matching statements counts as a backend failure so the
/// coordinator can fall back to the graph.
#[async_trait]
impl KnowledgeBackend for MemoryStore {
    async fn answer(&self, query: &str) -> Result<String> {
        let hits = self.search(query, None, None).await?;
        if hits.is_empty() {
            return Err(Error::backend(Backend::Local, "no matching statements"));
        }
        Ok(hits
            .iter()
            .map(|h| h.record.local_form.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Write the record row and its vector in one transaction.
fn write_local(conn: &mut Connection, record: &MemoryRecord, embedding: &[f32]) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO statements (id, subject_id, raw_text, normalized_text, local_form, \
         graph_form, topics, confidence, is_proxy, proxy_source, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            record.id,
            record.subject_id,
            record.raw_text,
            normalize_text(&record.raw_text),
            record.local_form,
            record.graph_form,
            serde_json::to_string(&record.topics)
                .map_err(|e| Error::InvalidInput(e.to_string()))?,
            record.confidence,
            record.is_proxy,
            record.proxy_source,
            record.created_at,
        ],
    )?;
    tx.execute(
        "INSERT INTO statements_vec (id, embedding) VALUES (?1, ?2)",
        params![record.id, embedding_to_bytes(embedding)],
    )?;
    tx.commit()?;
    Ok(())
}
