use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, warn};

use crate::news::NewsItem;

/// SQLite table of fetched headlines. Opened per command and dropped afterwards.
pub struct NewsStore {
    conn: Connection,
}

impl NewsStore {
    /// Open or create the database at the given path and ensure the table exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::run_migrations(&conn)?;
        debug!("News store opened at: {}", path.display());
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS news (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                published_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )
        .context("Failed to create news table")?;
        Ok(())
    }

    pub fn insert(&self, item: &NewsItem) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO news (title, url, published_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![item.title, item.url, item.published_at.to_rfc3339()],
            )
            .context("Failed to insert news item")?;
        Ok(())
    }

    /// Insert every item, logging and skipping rows that fail. Returns the number stored.
    pub fn insert_all(&self, items: &[NewsItem]) -> usize {
        let mut stored = 0;
        for item in items {
            match self.insert(item) {
                Ok(()) => stored += 1,
                Err(e) => warn!("Failed to insert news item '{}': {:#}", item.title, e),
            }
        }
        stored
    }

    #[cfg(test)]
    fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT count(*) FROM news", [], |row| row.get(0))?)
    }
}
