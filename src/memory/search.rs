//! Combined content-similarity / topic-match ranked search.
//!
//! Every stored record for the subject is scored as
//! `content_similarity + topic_score * topic_boost`. A record is included when
//! its content similarity clears the threshold **or** its topic matches the
//! query — topic-only matches are never dropped just because content
//! similarity is low.

use rusqlite::{params, Connection, Row};
use std::collections::HashMap;

use crate::error::Result;
use crate::memory::types::{MemoryRecord, SearchHit};
use crate::memory::{embedding_to_bytes, l2_to_cosine};

/// Scoring knobs, resolved from config by the caller.
#[derive(Debug, Clone, Copy)]
pub struct RankingParams {
    /// Content-similarity floor for inclusion.
    pub similarity_threshold: f64,
    /// Score granted when the query is a substring of a topic label.
    pub partial_topic_score: f64,
    /// Weight of the topic score in the combined score.
    pub topic_boost: f64,
}

/// Rank the subject's stored statements against a query.
pub fn search(
    conn: &Connection,
    subject_id: &str,
    query_text: &str,
    query_embedding: &[f32],
    limit: usize,
    ranking: RankingParams,
) -> Result<Vec<SearchHit>> {
    let similarities = all_similarities(conn, query_embedding)?;
    let records = fetch_subject_records(conn, subject_id)?;

    let mut hits: Vec<SearchHit> = Vec::new();
    for record in records {
        let content_similarity = similarities.get(&record.id).copied().unwrap_or(0.0);
        let topic_score = topic_match_score(query_text, &record.topics, ranking.partial_topic_score);

        if content_similarity < ranking.similarity_threshold && topic_score <= 0.0 {
            continue;
        }

        let score = content_similarity + topic_score * ranking.topic_boost;
        hits.push(SearchHit {
            record,
            score,
            content_similarity,
            topic_score,
        });
    }

    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(limit);
    Ok(hits)
}

/// Score the query against a record's topic labels: 1.0 on an exact label
/// match, the partial score on a substring match in either direction, else 0.
pub fn topic_match_score(query: &str, topics: &[String], partial_score: f64) -> f64 {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0.0;
    }
    let mut best = 0.0f64;
    for topic in topics {
        let label = topic.to_lowercase();
        let score = if label == query {
            1.0
        } else if label.contains(&query) || query.contains(&label) {
            partial_score
        } else {
            0.0
        };
        best = best.max(score);
    }
    best
}

/// Cosine similarity of the query against every stored vector.
///
/// The KNN limit is set to the vector table's row count so the scan is
/// exhaustive — a personal store is small and the inclusion rule needs a
/// similarity for every record, not just the nearest few.
fn all_similarities(conn: &Connection, query_embedding: &[f32]) -> Result<HashMap<String, f64>> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM statements_vec", [], |r| r.get(0))?;
    if total == 0 {
        return Ok(HashMap::new());
    }

    let mut stmt = conn.prepare(
        "SELECT id, distance FROM statements_vec \
         WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![embedding_to_bytes(query_embedding), total], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows
        .into_iter()
        .map(|(id, distance)| (id, l2_to_cosine(distance)))
        .collect())
}

/// Fetch all of the subject's records.
pub fn fetch_subject_records(conn: &Connection, subject_id: &str) -> Result<Vec<MemoryRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, subject_id, raw_text, local_form, graph_form, topics, confidence, \
         is_proxy, proxy_source, created_at \
         FROM statements WHERE subject_id = ?1 ORDER BY created_at",
    )?;
    let records = stmt
        .query_map(params![subject_id], record_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Fetch a single record by id, scoped to the subject.
pub fn fetch_record(
    conn: &Connection,
    subject_id: &str,
    id: &str,
) -> Result<Option<MemoryRecord>> {
    use rusqlite::OptionalExtension;
    let record = conn
        .query_row(
            "SELECT id, subject_id, raw_text, local_form, graph_form, topics, confidence, \
             is_proxy, proxy_source, created_at \
             FROM statements WHERE id = ?1 AND subject_id = ?2",
            params![id, subject_id],
            record_from_row,
        )
        .optional()?;
    Ok(record)
}

pub(crate) fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MemoryRecord> {
    let topics_json: String = row.get(5)?;
    let topics: Vec<String> = serde_json::from_str(&topics_json).unwrap_or_default();
    Ok(MemoryRecord {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        raw_text: row.get(2)?,
        local_form: row.get(3)?,
        graph_form: row.get(4)?,
        topics,
        confidence: row.get(6)?,
        is_proxy: row.get(7)?,
        proxy_source: row.get(8)?,
        created_at: row.get(9)?,
    })
}
