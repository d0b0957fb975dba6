use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;

use crate::model::{CategoryTerm, OutputRecord};
use crate::pipeline::RecordSink;

pub const DEFAULT_DB_PATH: &str = "data/cms-etl.sqlite";

/// SQLite-backed record sink. Documents are keyed by source id, so
/// re-running a migration replaces records in place.
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let count = |sql: &str| -> Result<usize> {
            Ok(self.conn.query_row(sql, [], |r| r.get(0))?)
        };
        Ok(StoreStats {
            documents: count("SELECT COUNT(*) FROM documents")?,
            sections: count("SELECT COUNT(*) FROM sections")?,
            topic_refs: count("SELECT COUNT(*) FROM topic_refs")?,
            attachments: count("SELECT COUNT(*) FROM attachments")?,
            terms: count("SELECT COUNT(*) FROM terms")?,
            last_updates: count("SELECT COUNT(*) FROM documents WHERE is_last_update = 1")?,
        })
    }

    /// Resolved reference targets stored for one document, in order.
    pub fn fetch_topic_refs(&self, source_id: &str) -> Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT title, target_id FROM topic_refs WHERE source_id = ?1 ORDER BY position",
        )?;
        let rows = stmt
            .query_map([source_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

pub struct StoreStats {
    pub documents: usize,
    pub sections: usize,
    pub topic_refs: usize,
    pub attachments: usize,
    pub terms: usize,
    pub last_updates: usize,
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            source_id      TEXT PRIMARY KEY,
            kind           TEXT NOT NULL CHECK(kind IN ('article','chapter','home')),
            headline       TEXT,
            language       TEXT NOT NULL,
            release_date   TEXT,
            is_last_update BOOLEAN NOT NULL DEFAULT 0,
            level_index    TEXT,
            project_term   INTEGER,
            hierarchy_term INTEGER,
            extras         TEXT,
            stored_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_documents_kind ON documents(kind);

        CREATE TABLE IF NOT EXISTS sections (
            id        INTEGER PRIMARY KEY,
            source_id TEXT NOT NULL REFERENCES documents(source_id),
            position  INTEGER NOT NULL,
            heading   TEXT NOT NULL,
            body      TEXT NOT NULL,
            UNIQUE(source_id, position)
        );
        CREATE INDEX IF NOT EXISTS idx_sections_doc ON sections(source_id);

        CREATE TABLE IF NOT EXISTS topic_refs (
            id        INTEGER PRIMARY KEY,
            source_id TEXT NOT NULL REFERENCES documents(source_id),
            position  INTEGER NOT NULL,
            title     TEXT NOT NULL,
            target_id TEXT NOT NULL,
            UNIQUE(source_id, target_id)
        );
        CREATE INDEX IF NOT EXISTS idx_topic_refs_doc ON topic_refs(source_id);

        CREATE TABLE IF NOT EXISTS attachments (
            id          INTEGER PRIMARY KEY,
            source_id   TEXT NOT NULL REFERENCES documents(source_id),
            position    INTEGER NOT NULL,
            filename    TEXT NOT NULL,
            url         TEXT NOT NULL,
            kind        TEXT NOT NULL,
            size        INTEGER NOT NULL,
            description TEXT NOT NULL,
            mime_type   TEXT NOT NULL,
            extra       TEXT,
            UNIQUE(source_id, position)
        );
        CREATE INDEX IF NOT EXISTS idx_attachments_doc ON attachments(source_id);

        CREATE TABLE IF NOT EXISTS terms (
            id           INTEGER PRIMARY KEY,
            vocabulary   TEXT NOT NULL,
            name         TEXT NOT NULL,
            code         TEXT,
            parent_chain TEXT,
            UNIQUE(vocabulary, name)
        );
        ",
    )?;
    Ok(())
}

impl RecordSink for SqliteSink {
    fn store(&mut self, record: &OutputRecord) -> Result<String> {
        let tx = self.conn.unchecked_transaction()?;
        {
            // Children are replaced wholesale so a re-run never leaves
            // stale rows behind; they go first, or replacing the document
            // row would trip the foreign keys.
            for table in ["sections", "topic_refs", "attachments"] {
                tx.execute(
                    &format!("DELETE FROM {} WHERE source_id = ?1", table),
                    rusqlite::params![record.source_id],
                )?;
            }

            let extras = if record.extras.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&record.extras)?)
            };
            tx.execute(
                "INSERT OR REPLACE INTO documents
                 (source_id, kind, headline, language, release_date, is_last_update,
                  level_index, project_term, hierarchy_term, extras)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    record.source_id,
                    record.kind.as_str(),
                    record.headline,
                    record.language,
                    record.release_date,
                    record.is_last_update,
                    record.level_index,
                    record.project_term,
                    record.hierarchy_term,
                    extras,
                ],
            )?;

            let mut s_stmt = tx.prepare(
                "INSERT INTO sections (source_id, position, heading, body)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (i, s) in record.sections.iter().enumerate() {
                s_stmt.execute(rusqlite::params![record.source_id, i as i64, s.heading, s.body])?;
            }

            let mut r_stmt = tx.prepare(
                "INSERT OR IGNORE INTO topic_refs (source_id, position, title, target_id)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (i, r) in record.resolved_refs.iter().enumerate() {
                r_stmt.execute(rusqlite::params![record.source_id, i as i64, r.title, r.target_id])?;
            }

            let mut a_stmt = tx.prepare(
                "INSERT INTO attachments
                 (source_id, position, filename, url, kind, size, description, mime_type, extra)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for (i, a) in record.attachments.iter().enumerate() {
                let extra = if a.extra.is_empty() {
                    None
                } else {
                    Some(serde_json::to_string(&a.extra)?)
                };
                a_stmt.execute(rusqlite::params![
                    record.source_id,
                    i as i64,
                    a.filename,
                    a.url,
                    a.kind,
                    a.size,
                    a.description,
                    a.mime_type,
                    extra,
                ])?;
            }
        }
        tx.commit()?;
        Ok(record.source_id.clone())
    }

    fn store_terms(&mut self, terms: &[CategoryTerm]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO terms (id, vocabulary, name, code, parent_chain)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for t in terms {
                let chain = if t.parent_chain.is_empty() {
                    None
                } else {
                    Some(serde_json::to_string(&t.parent_chain)?)
                };
                count += stmt.execute(rusqlite::params![t.id, t.vocabulary, t.name, t.code, chain])?;
            }
        }
        tx.commit()?;
        Ok(count)
    }
}

// ── Tests ──
