use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::error::UsageError;

/// What to do with an entry below the root that cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreadablePolicy {
    /// Count it as zero bytes and keep walking.
    #[default]
    Skip,
    /// Fail the whole computation.
    Abort,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectorySizeCalculator {
    policy: UnreadablePolicy,
    follow_symlinks: bool,
}

impl DirectorySizeCalculator {
    pub fn new(policy: UnreadablePolicy, follow_symlinks: bool) -> Self {
        Self {
            policy,
            follow_symlinks,
        }
    }

    pub fn compute_size(&self, path: &Path) -> Result<u64, UsageError> {
        self.compute_size_with_cancel(path, &CancellationToken::new())
    }

    /// Total bytes of the regular files under `path`. Symbolic links count
    /// as nothing unless the calculator follows them.
    pub fn compute_size_with_cancel(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, UsageError> {
        std::fs::metadata(path).map_err(|e| UsageError::from_io(path, e))?;

        let mut total: u64 = 0;
        let mut skipped: usize = 0;

        for entry in WalkDir::new(path).follow_links(self.follow_symlinks) {
            if cancel.is_cancelled() {
                return Err(UsageError::OperationCancelled);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    // the root itself must be readable whatever the policy
                    if err.depth() == 0 {
                        return Err(walk_error(path, err));
                    }
                    self.unreadable(path, err)?;
                    skipped += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            match entry.metadata() {
                Ok(meta) => total = total.saturating_add(meta.len()),
                Err(err) => {
                    self.unreadable(path, err)?;
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            log::debug!("{}: skipped {} unreadable entries", path.display(), skipped);
        }

        Ok(total)
    }

    fn unreadable(&self, root: &Path, err: walkdir::Error) -> Result<(), UsageError> {
        let vanished = err
            .io_error()
            .map(|e| e.kind() == io::ErrorKind::NotFound)
            .unwrap_or(false);

        if vanished || self.policy == UnreadablePolicy::Skip {
            log::debug!("skipping unreadable entry: {}", err);
            return Ok(());
        }
        Err(walk_error(root, err))
    }
}

fn walk_error(root: &Path, err: walkdir::Error) -> UsageError {
    let path = err.path().unwrap_or(root).to_path_buf();
    UsageError::from_io(path, io::Error::from(err))
}
