use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::services::directory_size::UnreadablePolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub version: String,
    pub server: ServerSettings,
    pub paths: PathSettings,
    pub database: DatabaseSettings,
    pub usage: UsageSettings,
    pub auth: AuthSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            server: ServerSettings::default(),
            paths: PathSettings::default(),
            database: DatabaseSettings::default(),
            usage: UsageSettings::default(),
            auth: AuthSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Application root; every file under it counts towards disk usage.
    pub root_directory: PathBuf,
    /// Tree media directories are relative to this one.
    pub data_directory: PathBuf,
    pub default_media_directory: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            root_directory: PathBuf::from("."),
            data_directory: PathBuf::from("data"),
            default_media_directory: "media/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub table_prefix: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data").join("genealogy.db"),
            table_prefix: "wt_".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageSettings {
    pub size_cache_ttl_secs: u64,
    /// Zero disables the deadline.
    pub report_timeout_secs: u64,
    pub unreadable: UnreadablePolicy,
    pub follow_symlinks: bool,
    pub default_tree: Option<i64>,
    pub display_precision: usize,
}

impl Default for UsageSettings {
    fn default() -> Self {
        Self {
            size_cache_ttl_secs: 60,
            report_timeout_secs: 30,
            unreadable: UnreadablePolicy::default(),
            follow_symlinks: false,
            default_tree: None,
            display_precision: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub admin_tokens: Vec<String>,
}
