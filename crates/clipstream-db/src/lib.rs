pub mod feed;
pub mod migrations;
pub mod models;
pub mod playlists;
pub mod queries;
pub mod reactions;
pub mod stats;
pub mod subscriptions;

use clipstream_types::{Error, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// How long a store call may wait on a locked database before it fails
/// `Unavailable`. Retrying is the caller's job, not this layer's.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).store()?;
        Self::init(&conn)?;
        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, used by tests and throwaway dev setups.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().store()?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init(conn: &Connection) -> Result<()> {
        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL").store()?;
        conn.pragma_update(None, "foreign_keys", "ON").store()?;
        conn.busy_timeout(BUSY_TIMEOUT).store()?;
        migrations::run(conn)
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::Unavailable(format!("DB lock poisoned: {e}")))?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        self.with_conn(f)
    }
}

/// Translate rusqlite failures into the shared taxonomy. Uniqueness
/// violations become `Conflict`; a busy or locked database becomes
/// `Unavailable`, as does anything else the store throws at us.
pub(crate) fn store_error(e: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(f, msg) = &e {
        match f.code {
            rusqlite::ErrorCode::ConstraintViolation => {
                return Error::Conflict(
                    msg.clone().unwrap_or_else(|| "constraint violation".into()),
                );
            }
            rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                return Error::Unavailable(e.to_string());
            }
            _ => {}
        }
    }
    Error::Unavailable(e.to_string())
}

pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _) if f.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Extension trait mapping rusqlite results into the shared taxonomy.
pub(crate) trait StoreResultExt<T> {
    fn store(self) -> Result<T>;
    fn optional(self) -> Result<Option<T>>;
}

impl<T> StoreResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn store(self) -> Result<T> {
        self.map_err(store_error)
    }

    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(store_error(e)),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::Database;
    use uuid::Uuid;

    pub fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    pub fn seed_user(db: &Database, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, username, &format!("{username} Fullname"), "", "hash")
            .unwrap();
        id
    }

    pub fn seed_video(db: &Database, owner_id: &str, title: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.insert_video(
            &id,
            owner_id,
            title,
            "a description",
            "https://cdn.example/v.mp4",
            "https://cdn.example/t.jpg",
            120.0,
        )
        .unwrap();
        id
    }
}
