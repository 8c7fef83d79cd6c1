//! Append-only SQLite log of inbound user messages.

use rusqlite::{Connection, OpenFlags, params};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// One stored inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedMessage {
    pub id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub message_text: String,
}

#[derive(Debug)]
pub enum LogError {
    Open { path: PathBuf, source: rusqlite::Error },
    Sqlite(rusqlite::Error),
    /// A previous writer panicked while holding the connection.
    Poisoned,
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "failed to open message log '{}': {}", path.display(), source)
            }
            Self::Sqlite(e) => write!(f, "message log error: {e}"),
            Self::Poisoned => write!(f, "message log connection poisoned"),
        }
    }
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Sqlite(e) => Some(e),
            Self::Poisoned => None,
        }
    }
}

impl From<rusqlite::Error> for LogError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

pub struct MessageLog {
    conn: Mutex<Connection>,
}

impl MessageLog {
    /// Open (or create) the log at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, LogError> {
        let conn = Connection::open(path).map_err(|source| LogError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let log = Self { conn: Mutex::new(conn) };
        log.init_schema()?;
        info!("Opened message log at {:?} ({} rows)", path, log.count()?);
        Ok(log)
    }

    /// Open an existing log for reading. Never creates the file or the table.
    pub fn open_read_only(path: &Path) -> Result<Self, LogError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| LogError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn in_memory() -> Result<Self, LogError> {
        let conn = Connection::open_in_memory()?;
        let log = Self { conn: Mutex::new(conn) };
        log.init_schema()?;
        Ok(log)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LogError> {
        self.conn.lock().map_err(|_| LogError::Poisoned)
    }

    /// Idempotent.
    pub fn init_schema(&self) -> Result<(), LogError> {
        self.lock()?.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER,
                username TEXT,
                message TEXT
            );
            "#,
        )?;
        Ok(())
    }

    /// Insert one row and return its id.
    pub fn append(&self, user_id: i64, username: Option<&str>, message_text: &str) -> Result<i64, LogError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO messages (user_id, username, message) VALUES (?1, ?2, ?3)",
            params![user_id, username, message_text],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn count(&self) -> Result<usize, LogError> {
        let count: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Most recent rows, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<LoggedMessage>, LogError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, username, message FROM messages ORDER BY id DESC LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map([limit], |row| {
            Ok(LoggedMessage {
                id: row.get(0)?,
                user_id: row.get(1)?,
                username: row.get(2)?,
                message_text: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn latest(&self) -> Result<Option<LoggedMessage>, LogError> {
        Ok(self.recent(1)?.into_iter().next())
    }

    /// Simulates the storage going away underneath the relay.
    #[cfg(test)]
    pub(crate) fn break_storage(&self) {
        self.lock().unwrap().execute_batch("DROP TABLE messages").unwrap();
    }
}
