//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Corpus-Harvester database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Content-addressed ids of every item already harvested
CREATE TABLE IF NOT EXISTS fetched (
    id TEXT PRIMARY KEY,
    fetched_at TEXT NOT NULL
);

-- Track driver passes
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    items_harvested INTEGER NOT NULL DEFAULT 0
);
"#;

/// Initializes the database schema
///
/// Safe to call on an existing database; every statement is `IF NOT EXISTS`.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
