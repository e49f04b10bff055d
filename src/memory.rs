//! Durable translation memory backed by sqlite.
//!
//! Unlike the ephemeral cache, entries here survive restarts and never
//! expire. Each (source_text, target_language) pair maps to exactly one row;
//! re-storing a pair bumps its usage counter and refreshes the stored
//! translation and quality score. Scores carry the quality formula version
//! they were computed with, so callers can detect stale scores after the
//! formula changes.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// One remembered translation.
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    pub source_text: String,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    pub quality_score: f64,
    pub quality_version: u32,
    pub usage_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Aggregate view over the whole memory.
#[derive(Debug, Clone)]
pub struct MemoryStatistics {
    pub total_entries: usize,
    /// Sum of usage counters across all entries
    pub total_usage: i64,
    /// Mean stored quality score, 0.0 when empty
    pub average_quality: f64,
    /// Entry counts keyed by "source->target"
    pub entries_per_pair: BTreeMap<String, usize>,
}

#[derive(Clone)]
pub struct TranslationMemory {
    conn: Arc<Mutex<Connection>>,
}

impl TranslationMemory {
    /// Open (or create) the memory database at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .context(format!("Failed to open translation memory at {}", path))?;
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests and ephemeral deployments.
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory translation memory")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS translations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_text TEXT NOT NULL,
                translated_text TEXT NOT NULL,
                source_language TEXT NOT NULL,
                target_language TEXT NOT NULL,
                quality_score REAL NOT NULL,
                quality_version INTEGER NOT NULL,
                usage_count INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(source_text, target_language)
            )",
            [],
        )
        .context("Failed to create translations table")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Store a translation, or refresh it if the (source_text,
    /// target_language) pair already exists.
    ///
    /// On conflict the stored translation, source language, score and score
    /// version are overwritten and the usage counter is incremented.
    pub fn store(
        &self,
        source_text: &str,
        translated_text: &str,
        source_language: &str,
        target_language: &str,
        quality_score: f64,
        quality_version: u32,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO translations
                (source_text, translated_text, source_language, target_language,
                 quality_score, quality_version, usage_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
             ON CONFLICT(source_text, target_language) DO UPDATE SET
                translated_text = excluded.translated_text,
                source_language = excluded.source_language,
                quality_score = excluded.quality_score,
                quality_version = excluded.quality_version,
                usage_count = usage_count + 1,
                updated_at = excluded.updated_at",
            params![
                source_text,
                translated_text,
                source_language,
                target_language,
                quality_score,
                quality_version,
                now
            ],
        )
        .context("Failed to store translation")?;

        Ok(())
    }

    /// Look up a remembered translation for a (source_text, target_language)
    /// pair. Does not touch the usage counter.
    pub fn lookup(&self, source_text: &str, target_language: &str) -> Result<Option<MemoryEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT source_text, translated_text, source_language, target_language,
                    quality_score, quality_version, usage_count, created_at, updated_at
             FROM translations
             WHERE source_text = ?1 AND target_language = ?2",
        )?;

        let entry = stmt
            .query_row(params![source_text, target_language], |row| {
                Ok(MemoryEntry {
                    source_text: row.get(0)?,
                    translated_text: row.get(1)?,
                    source_language: row.get(2)?,
                    target_language: row.get(3)?,
                    quality_score: row.get(4)?,
                    quality_version: row.get::<_, i64>(5)? as u32,
                    usage_count: row.get(6)?,
                    created_at: row.get(7)?,
                    updated_at: row.get(8)?,
                })
            })
            .optional()?;

        Ok(entry)
    }

    /// Rewrite the stored quality score and version for an existing entry.
    ///
    /// Used when a score computed under an older formula version is
    /// re-assessed; deliberately leaves usage_count alone since no new
    /// translation request was served from this call.
    pub fn update_quality(
        &self,
        source_text: &str,
        target_language: &str,
        quality_score: f64,
        quality_version: u32,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let rows_affected = conn
            .execute(
                "UPDATE translations
                 SET quality_score = ?1, quality_version = ?2, updated_at = ?3
                 WHERE source_text = ?4 AND target_language = ?5",
                params![quality_score, quality_version, now, source_text, target_language],
            )
            .context("Failed to update quality score")?;

        Ok(rows_affected > 0)
    }

    /// Delete a remembered translation. Returns whether an entry existed.
    pub fn remove(&self, source_text: &str, target_language: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn
            .execute(
                "DELETE FROM translations
                 WHERE source_text = ?1 AND target_language = ?2",
                params![source_text, target_language],
            )
            .context("Failed to remove translation")?;
        Ok(rows_affected > 0)
    }

    /// Number of remembered translations.
    pub fn entry_count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Aggregate statistics over the whole memory.
    pub fn statistics(&self) -> Result<MemoryStatistics> {
        let conn = self.conn.lock().unwrap();

        let (total_entries, total_usage, average_quality): (i64, i64, f64) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(usage_count), 0),
                    COALESCE(AVG(quality_score), 0.0)
             FROM translations",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mut stmt = conn.prepare(
            "SELECT source_language, target_language, COUNT(*)
             FROM translations
             GROUP BY source_language, target_language",
        )?;
        let entries_per_pair = stmt
            .query_map([], |row| {
                let source: String = row.get(0)?;
                let target: String = row.get(1)?;
                let count: i64 = row.get(2)?;
                Ok((format!("{}->{}", source, target), count as usize))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(MemoryStatistics {
            total_entries: total_entries as usize,
            total_usage,
            average_quality,
            entries_per_pair,
        })
    }
}
