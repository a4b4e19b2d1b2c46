//! Explicit deletion — by id, by topic, or everything for a subject.
//!
//! Records are never implicitly expired; this is the only destruction path.
//! The local rows and vectors go in one transaction; the store layer mirrors
//! the deletes to the graph service best-effort.

use rusqlite::{params, Connection};
use tracing::info;

use crate::error::Result;

/// What to delete.
#[derive(Debug, Clone)]
pub enum ForgetTarget {
    /// A single record by id.
    Id(String),
    /// Every record carrying this topic label.
    Topic(String),
    /// Every record for the subject.
    All,
}

/// Delete matching records and their vectors. Returns the removed ids so the
/// caller can mirror the deletes to the graph backend.
pub fn forget(conn: &mut Connection, subject_id: &str, target: &ForgetTarget) -> Result<Vec<String>> {
    let tx = conn.transaction()?;

    let ids: Vec<String> = match target {
        ForgetTarget::Id(id) => {
            let mut stmt =
                tx.prepare("SELECT id FROM statements WHERE id = ?1 AND subject_id = ?2")?;
            let ids = stmt
                .query_map(params![id, subject_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            ids
        }
        ForgetTarget::Topic(topic) => {
            let mut stmt = tx.prepare(
                "SELECT id FROM statements WHERE subject_id = ?1 AND EXISTS \
                 (SELECT 1 FROM json_each(statements.topics) WHERE json_each.value = ?2)",
            )?;
            let ids = stmt
                .query_map(params![subject_id, topic], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            ids
        }
        ForgetTarget::All => {
            let mut stmt = tx.prepare("SELECT id FROM statements WHERE subject_id = ?1")?;
            let ids = stmt
                .query_map(params![subject_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            ids
        }
    };

    for id in &ids {
        tx.execute("DELETE FROM statements WHERE id = ?1", params![id])?;
        tx.execute("DELETE FROM statements_vec WHERE id = ?1", params![id])?;
    }

    tx.commit()?;

    info!(subject = subject_id, count = ids.len(), "forgot statements");
    Ok(ids)
}
