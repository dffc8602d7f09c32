use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("i/o error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("media directory `{}` leaves the data directory", .0.display())]
    OutsideDataDirectory(PathBuf),

    #[error("database unavailable: {0}")]
    DatabaseUnavailable(String),

    #[error("malformed table metadata for `{table}`: missing {field}")]
    MalformedMetadata { table: String, field: &'static str },

    #[error("operation cancelled")]
    OperationCancelled,

    #[error("worker failed: {0}")]
    Worker(String),
}

impl From<rusqlite::Error> for UsageError {
    fn from(err: rusqlite::Error) -> Self {
        UsageError::DatabaseUnavailable(err.to_string())
    }
}

impl UsageError {
    /// Classify an I/O failure on `path`.
    pub fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => UsageError::PathNotFound(path),
            io::ErrorKind::PermissionDenied => UsageError::PermissionDenied(path),
            _ => UsageError::Io { path, source: err },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, UsageError::OperationCancelled)
    }
}

/// The sub-computation of a report that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    IndividualCount,
    MediaCount,
    DatabaseSize,
    MediaDirectory,
    RootDirectory,
    Configuration,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::IndividualCount => "individual count",
            Stage::MediaCount => "media count",
            Stage::DatabaseSize => "database size",
            Stage::MediaDirectory => "media directory size",
            Stage::RootDirectory => "root directory size",
            Stage::Configuration => "path resolution",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct ReportError {
    pub stage: Stage,
    #[source]
    pub source: UsageError,
}

impl ReportError {
    pub fn new(stage: Stage, source: UsageError) -> Self {
        Self { stage, source }
    }

    pub fn kind(&self) -> &UsageError {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_classified_by_kind() {
        let missing = UsageError::from_io("/nope", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(missing, UsageError::PathNotFound(_)));

        let denied = UsageError::from_io("/root", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, UsageError::PermissionDenied(_)));

        let other = UsageError::from_io("/dev", io::Error::from(io::ErrorKind::InvalidData));
        assert!(matches!(other, UsageError::Io { .. }));
    }

    #[test]
    fn report_error_names_the_stage() {
        let err = ReportError::new(
            Stage::DatabaseSize,
            UsageError::DatabaseUnavailable("connection reset".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "database size failed: database unavailable: connection reset"
        );
        assert!(matches!(err.kind(), UsageError::DatabaseUnavailable(_)));
    }
}
