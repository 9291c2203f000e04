pub mod models;

use models::{AnalysisHistory, NewAnalysisHistory, User};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database connection lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Append-only log of completed analyses.
pub trait HistoryStore: Send + Sync {
    fn append(&self, record: NewAnalysisHistory<'_>) -> Result<AnalysisHistory>;
    fn list(&self) -> Result<Vec<AnalysisHistory>>;
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA foreign_keys=ON;

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                hashed_password TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS analysis_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                filename TEXT NOT NULL,
                result_json TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
                FOREIGN KEY (user_id) REFERENCES users(id)
            );
            ",
        )?;
        Ok(())
    }

    // ── Users ──

    /// Insert the user if the username is new, then return the stored row.
    pub fn ensure_user(&self, username: &str, hashed_password: &str) -> Result<User> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO users (username, hashed_password) VALUES (?1, ?2)",
            params![username, hashed_password],
        )?;
        let user = conn.query_row(
            "SELECT id, username, hashed_password FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    hashed_password: row.get(2)?,
                })
            },
        )?;
        Ok(user)
    }
}

fn history_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnalysisHistory> {
    Ok(AnalysisHistory {
        id: row.get(0)?,
        user_id: row.get(1)?,
        filename: row.get(2)?,
        result_json: row.get(3)?,
        created_at: row.get(4)?,
    })
}

// ── Analysis history ──

impl HistoryStore for Database {
    fn append(&self, record: NewAnalysisHistory<'_>) -> Result<AnalysisHistory> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO analysis_history (user_id, filename, result_json) VALUES (?1, ?2, ?3)",
            params![record.user_id, record.filename, record.result_json],
        )?;
        let id = conn.last_insert_rowid();
        let saved = conn.query_row(
            "SELECT id, user_id, filename, result_json, created_at FROM analysis_history WHERE id = ?1",
            params![id],
            history_from_row,
        )?;
        Ok(saved)
    }

    fn list(&self) -> Result<Vec<AnalysisHistory>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, filename, result_json, created_at FROM analysis_history ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], history_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }
}
