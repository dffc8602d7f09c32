use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use rusqlite::Connection;
use tokio_util::sync::CancellationToken;

use super::{open_read_only, queries, UsageStore};
use crate::error::UsageError;
use crate::models::{Entity, TableStatus};

// VM instructions between cancellation checks.
const PROGRESS_OPS: i32 = 1000;

pub fn is_valid_table_prefix(prefix: &str) -> bool {
    prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// SQLite-backed store. Every call opens its own read-only connection so
/// concurrent report stages never share a handle.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
    table_prefix: String,
}

impl SqliteStore {
    pub fn new(
        db_path: impl Into<PathBuf>,
        table_prefix: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let table_prefix = table_prefix.into();
        if !is_valid_table_prefix(&table_prefix) {
            anyhow::bail!("invalid table prefix `{}`", table_prefix);
        }
        Ok(Self {
            db_path: db_path.into(),
            table_prefix,
        })
    }

    fn with_connection<T>(
        &self,
        cancel: &CancellationToken,
        op: impl FnOnce(&Connection, &str) -> rusqlite::Result<T>,
    ) -> Result<T, UsageError> {
        if cancel.is_cancelled() {
            return Err(UsageError::OperationCancelled);
        }

        let conn = open_read_only(&self.db_path)?;
        let watch = AssertUnwindSafe(cancel.clone());
        conn.progress_handler(PROGRESS_OPS, Some(move || watch.is_cancelled()));

        op(&conn, &self.table_prefix).map_err(|err| {
            if cancel.is_cancelled() {
                UsageError::OperationCancelled
            } else {
                err.into()
            }
        })
    }
}

impl UsageStore for SqliteStore {
    fn table_status(&self, cancel: &CancellationToken) -> Result<Vec<TableStatus>, UsageError> {
        self.with_connection(cancel, |conn, _| queries::table_status(conn))
    }

    fn count_rows(&self, entity: Entity, cancel: &CancellationToken) -> Result<u64, UsageError> {
        self.with_connection(cancel, |conn, prefix| queries::count_rows(conn, prefix, entity))
    }

    fn media_directory(
        &self,
        tree: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, UsageError> {
        self.with_connection(cancel, |conn, prefix| {
            queries::media_directory_setting(conn, prefix, tree)
        })
    }
}
