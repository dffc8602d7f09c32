use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::database::UsageStore;
use crate::error::{ReportError, Stage, UsageError};
use crate::models::{Entity, ReportPaths, UsageReport};
use crate::services::database_size::DatabaseSizeCalculator;
use crate::services::directory_size::DirectorySizeCalculator;

/// Assembles a [`UsageReport`] from two row counts, the database size and
/// two directory walks. Either every figure is produced or the build fails.
pub struct UsageReportBuilder {
    store: Arc<dyn UsageStore>,
    database_size: Arc<DatabaseSizeCalculator>,
    directories: DirectorySizeCalculator,
    timeout: Option<Duration>,
}

impl UsageReportBuilder {
    pub fn new(
        store: Arc<dyn UsageStore>,
        database_size: Arc<DatabaseSizeCalculator>,
        directories: DirectorySizeCalculator,
    ) -> Self {
        Self {
            store,
            database_size,
            directories,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Media directory of `tree` (or of the first tree) under `data_directory`,
    /// next to the application root. The preference is always read relative
    /// to `data_directory`; a value with a `..` component is refused.
    pub async fn resolve_paths(
        &self,
        root_directory: &Path,
        data_directory: &Path,
        default_media_directory: &str,
        tree: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<ReportPaths, ReportError> {
        let store = self.store.clone();
        let setting = run_stage(Stage::Configuration, cancel.child_token(), move |token| {
            store.media_directory(tree, token)
        })
        .await?;

        let media = setting
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default_media_directory.to_string());

        let Some(relative) = relative_to_data(media.trim()) else {
            log::warn!("refusing media directory `{}`", media.trim());
            return Err(ReportError::new(
                Stage::Configuration,
                UsageError::OutsideDataDirectory(PathBuf::from(media.trim())),
            ));
        };

        Ok(ReportPaths {
            media_directory: data_directory.join(relative),
            root_directory: root_directory.to_path_buf(),
        })
    }

    pub async fn build(
        &self,
        paths: &ReportPaths,
        cancel: &CancellationToken,
    ) -> Result<UsageReport, ReportError> {
        let token = cancel.child_token();
        let _stop_workers = token.clone().drop_guard();

        let deadline = self.timeout.map(|limit| {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                log::warn!("usage report exceeded {:?}, cancelling", limit);
                token.cancel();
            })
        });

        let individuals = {
            let store = self.store.clone();
            run_stage(Stage::IndividualCount, token.clone(), move |t| {
                store.count_rows(Entity::Individuals, t)
            })
        };
        let media = {
            let store = self.store.clone();
            run_stage(Stage::MediaCount, token.clone(), move |t| store.count_rows(Entity::Media, t))
        };
        let database = {
            let calc = self.database_size.clone();
            run_stage(Stage::DatabaseSize, token.clone(), move |t| calc.compute_size_with_cancel(t))
        };
        let media_dir = self.walk(Stage::MediaDirectory, paths.media_directory.clone(), &token);
        let root_dir = self.walk(Stage::RootDirectory, paths.root_directory.clone(), &token);

        let joined = tokio::try_join!(individuals, media, database, media_dir, root_dir);

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        let (individual_count, media_count, database_bytes, media_bytes, root_bytes) =
            joined.map_err(|err| {
                log::error!("server usage report failed: {}", err);
                err
            })?;

        Ok(UsageReport::from_bytes(
            individual_count,
            media_count,
            database_bytes,
            media_bytes,
            root_bytes,
        ))
    }

    async fn walk(
        &self,
        stage: Stage,
        path: PathBuf,
        token: &CancellationToken,
    ) -> Result<u64, ReportError> {
        let calc = self.directories;
        run_stage(stage, token.clone(), move |t| calc.compute_size_with_cancel(&path, t)).await
    }
}

/// `value` as a path below the data directory. Leading separators are
/// dropped, so `/media` and `media` name the same place.
fn relative_to_data(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim_start_matches(|c: char| c == '/' || c == '\\');
    let mut relative = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}

/// Runs `work` on the blocking pool. A cancelled token resolves the stage at
/// once; the worker stops at its next cancellation check.
async fn run_stage<T, F>(stage: Stage, token: CancellationToken, work: F) -> Result<T, ReportError>
where
    T: Send + 'static,
    F: FnOnce(&CancellationToken) -> Result<T, UsageError> + Send + 'static,
{
    if token.is_cancelled() {
        return Err(ReportError::new(stage, UsageError::OperationCancelled));
    }

    let worker_token = token.clone();
    let handle = tokio::task::spawn_blocking(move || work(&worker_token));

    let result = tokio::select! {
        joined = handle => match joined {
            Ok(result) => result,
            Err(err) => Err(UsageError::Worker(err.to_string())),
        },
        _ = token.cancelled() => Err(UsageError::OperationCancelled),
    };

    if let Err(err) = &result {
        if !err.is_cancelled() {
            // let the sibling stages stop early
            token.cancel();
        }
    }
    result.map_err(|err| ReportError::new(stage, err))
}
