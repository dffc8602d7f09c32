use anyhow::Result;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::UsageError;
use crate::models::{Entity, TableStatus};

pub mod schema;
pub mod queries;
pub mod store;

pub use store::SqliteStore;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Read-only access to the host database. Calls block; run them off the
/// async executor.
pub trait UsageStore: Send + Sync {
    fn table_status(&self, cancel: &CancellationToken) -> Result<Vec<TableStatus>, UsageError>;

    fn count_rows(&self, entity: Entity, cancel: &CancellationToken) -> Result<u64, UsageError>;

    fn media_directory(
        &self,
        _tree: Option<i64>,
        _cancel: &CancellationToken,
    ) -> Result<Option<String>, UsageError> {
        Ok(None)
    }
}

pub fn init_database(db_path: &Path, prefix: &str) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(db_path)?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    schema::create_tables(&conn, prefix)?;

    Ok(conn)
}

/// Opens an existing database for queries only. The file is never created
/// and `query_only` rejects any statement that would write.
pub fn open_read_only(db_path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI,
    )?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update(None, "query_only", "ON")?;
    Ok(conn)
}
