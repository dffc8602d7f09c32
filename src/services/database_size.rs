use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::database::UsageStore;
use crate::error::UsageError;
use crate::models::TableStatus;

/// Sum of data and index bytes over `rows`.
pub fn sum_table_sizes(rows: &[TableStatus]) -> Result<u64, UsageError> {
    rows.iter().try_fold(0u64, |total, row| {
        let data = row.data_length.ok_or_else(|| UsageError::MalformedMetadata {
            table: row.name.clone(),
            field: "data_length",
        })?;
        let index = row.index_length.ok_or_else(|| UsageError::MalformedMetadata {
            table: row.name.clone(),
            field: "index_length",
        })?;
        Ok(total.saturating_add(data).saturating_add(index))
    })
}

#[derive(Debug, Clone, Copy)]
struct CachedSize {
    bytes: u64,
    computed_at: Instant,
}

/// Database footprint in bytes, memoized for a short while so repeated views
/// of the admin page do not rescan table metadata.
pub struct DatabaseSizeCalculator {
    store: Arc<dyn UsageStore>,
    ttl: Duration,
    cached: Mutex<Option<CachedSize>>,
}

impl DatabaseSizeCalculator {
    pub fn new(store: Arc<dyn UsageStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            cached: Mutex::new(None),
        }
    }

    pub fn compute_size(&self) -> Result<u64, UsageError> {
        self.compute_size_with_cancel(&CancellationToken::new())
    }

    pub fn compute_size_with_cancel(&self, cancel: &CancellationToken) -> Result<u64, UsageError> {
        if let Some(bytes) = self.fresh() {
            log::debug!("database size served from cache ({} bytes)", bytes);
            return Ok(bytes);
        }

        let rows = self.store.table_status(cancel)?;
        let bytes = sum_table_sizes(&rows)?;

        if !self.ttl.is_zero() {
            *self.cached.lock().unwrap_or_else(|e| e.into_inner()) = Some(CachedSize {
                bytes,
                computed_at: Instant::now(),
            });
        }
        Ok(bytes)
    }

    pub fn invalidate(&self) {
        *self.cached.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn fresh(&self) -> Option<u64> {
        let cached = (*self.cached.lock().unwrap_or_else(|e| e.into_inner()))?;
        (cached.computed_at.elapsed() < self.ttl).then_some(cached.bytes)
    }
}
