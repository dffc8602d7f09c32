use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub individual_count: u64,
    pub media_count: u64,
    pub database_size_mb: f64,
    pub media_directory_size_mb: f64,
    pub root_directory_size_mb: f64,
}

impl UsageReport {
    pub fn from_bytes(
        individual_count: u64,
        media_count: u64,
        database_bytes: u64,
        media_directory_bytes: u64,
        root_directory_bytes: u64,
    ) -> Self {
        Self {
            individual_count,
            media_count,
            database_size_mb: bytes_to_mb(database_bytes),
            media_directory_size_mb: bytes_to_mb(media_directory_bytes),
            root_directory_size_mb: bytes_to_mb(root_directory_bytes),
        }
    }

    /// Negative only when the media directory lives outside the root.
    pub fn other_files_mb(&self) -> f64 {
        self.root_directory_size_mb - self.media_directory_size_mb
    }

    pub fn total_server_mb(&self) -> f64 {
        self.database_size_mb + self.root_directory_size_mb
    }
}

/// One row of the table-metadata query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStatus {
    pub name: String,
    pub data_length: Option<u64>,
    pub index_length: Option<u64>,
}

impl TableStatus {
    pub fn new(name: impl Into<String>, data_length: u64, index_length: u64) -> Self {
        Self {
            name: name.into(),
            data_length: Some(data_length),
            index_length: Some(index_length),
        }
    }
}

/// Host records counted across all trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Individuals,
    Media,
}

impl Entity {
    pub fn table_suffix(&self) -> &'static str {
        match self {
            Entity::Individuals => "individuals",
            Entity::Media => "media",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub media_directory: PathBuf,
    pub root_directory: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_sizes() {
        let report = UsageReport::from_bytes(3, 1, 2 * 1_048_576, 4 * 1_048_576, 10 * 1_048_576);
        assert_eq!(report.database_size_mb, 2.0);
        assert_eq!(report.other_files_mb(), 6.0);
        assert_eq!(report.total_server_mb(), 12.0);
    }

    #[test]
    fn megabytes_are_binary() {
        assert_eq!(bytes_to_mb(1_048_576), 1.0);
        assert_eq!(bytes_to_mb(0), 0.0);
        assert!(bytes_to_mb(1_000_000) < 1.0);
    }

    #[test]
    fn media_outside_root_goes_negative() {
        let report = UsageReport::from_bytes(0, 0, 0, 5 * 1_048_576, 1_048_576);
        assert_eq!(report.other_files_mb(), -4.0);
    }
}
