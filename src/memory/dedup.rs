//! Deduplication engine — a pure accept/reject decision over stored statements.
//!
//! Policy, in order: exact match on normalized text for the subject, then
//! cosine similarity against every stored embedding for the subject via
//! sqlite-vec KNN. A candidate at or above the similarity threshold is a
//! duplicate of the most similar record. The caller performs all writes.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::Result;
use crate::memory::{embedding_to_bytes, l2_to_cosine, normalize_text};

/// Outcome of a dedup check.
#[derive(Debug, Clone, PartialEq)]
pub enum DedupDecision {
    /// The statement is new. Carries the similarity of the nearest existing
    /// record (if any) so the confidence scorer gets its novelty input for free.
    Accept { nearest_similarity: Option<f64> },
    /// The statement duplicates `existing_id`.
    Duplicate { existing_id: String, similarity: f64 },
}

/// Decide whether `candidate_text` duplicates a stored statement for the
/// subject. Pure decision — no side effects.
pub fn check(
    conn: &Connection,
    subject_id: &str,
    candidate_text: &str,
    embedding: &[f32],
    similarity_threshold: f64,
) -> Result<DedupDecision> {
    // 1. Exact match on normalized text
    let normalized = normalize_text(candidate_text);
    let exact: Option<String> = conn
        .query_row(
            "SELECT id FROM statements WHERE subject_id = ?1 AND normalized_text = ?2 LIMIT 1",
            params![subject_id, normalized],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(existing_id) = exact {
        debug!(%existing_id, "dedup: exact text match");
        return Ok(DedupDecision::Duplicate {
            existing_id,
            similarity: 1.0,
        });
    }

    // 2. Nearest-neighbor similarity, scoped to the subject. The KNN limit
    // is the vector table's row count: the scan must be exhaustive, or a
    // same-subject duplicate could be crowded out of a fixed-size top-k by
    // another subject's nearer vectors.
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM statements_vec", [], |r| r.get(0))?;
    if total == 0 {
        return Ok(DedupDecision::Accept {
            nearest_similarity: None,
        });
    }
    let mut stmt = conn.prepare(
        "SELECT id, distance FROM statements_vec \
         WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
    )?;
    let candidates: Vec<(String, f64)> = stmt
        .query_map(
            params![embedding_to_bytes(embedding), total],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut nearest: Option<(String, f64)> = None;
    for (candidate_id, distance) in candidates {
        // KNN runs over all subjects; keep only this subject's records
        let owned: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM statements WHERE id = ?1 AND subject_id = ?2",
            params![candidate_id, subject_id],
            |row| row.get(0),
        )?;
        if !owned {
            continue;
        }
        let similarity = l2_to_cosine(distance);
        if nearest.as_ref().map_or(true, |(_, s)| similarity > *s) {
            nearest = Some((candidate_id, similarity));
        }
    }

    match nearest {
        Some((existing_id, similarity)) if similarity >= similarity_threshold => {
            debug!(%existing_id, similarity, "dedup: similarity above threshold");
            Ok(DedupDecision::Duplicate {
                existing_id,
                similarity,
            })
        }
        Some((_, similarity)) => Ok(DedupDecision::Accept {
            nearest_similarity: Some(similarity),
        }),
        None => Ok(DedupDecision::Accept {
            nearest_similarity: None,
        }),
    }
}
