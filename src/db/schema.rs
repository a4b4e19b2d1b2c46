//! SQL DDL for all memoir tables.
//!
//! Defines the `statements` table, the `statements_vec` (vec0) virtual table
//! for nearest-neighbor queries, and the `schema_meta` key/value table. All
//! DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// Schema DDL for the regular tables.
const SCHEMA_SQL: &str = r#"
-- One row per accepted statement about a subject.
CREATE TABLE IF NOT EXISTS statements (
    id TEXT PRIMARY KEY,
    subject_id TEXT NOT NULL,
    raw_text TEXT NOT NULL,
    normalized_text TEXT NOT NULL,
    local_form TEXT NOT NULL,
    graph_form TEXT NOT NULL,
    topics TEXT NOT NULL,
    confidence REAL NOT NULL CHECK(confidence >= 0.0 AND confidence <= 1.0),
    is_proxy INTEGER NOT NULL DEFAULT 0 CHECK(is_proxy IN (0, 1)),
    proxy_source TEXT,
    created_at TEXT NOT NULL,
    CHECK(is_proxy = 0 OR proxy_source IS NOT NULL)
);

CREATE INDEX IF NOT EXISTS idx_statements_subject ON statements(subject_id);
CREATE INDEX IF NOT EXISTS idx_statements_normalized ON statements(subject_id, normalized_text);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// vec0 virtual table must be created separately (sqlite-vec syntax).
const VEC_TABLE_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS statements_vec USING vec0(
    id TEXT PRIMARY KEY,
    embedding FLOAT[384]
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(VEC_TABLE_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('embedding_dim', '384')",
        [],
    )?;

    Ok(())
}
