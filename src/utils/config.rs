use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::database::store::is_valid_table_prefix;
use crate::models::Settings;

const ENV_CONFIG: &str = "SERVER_USAGE_CONFIG";
const ENV_HOST: &str = "SERVER_USAGE_HOST";
const ENV_PORT: &str = "SERVER_USAGE_PORT";
const ENV_DB: &str = "SERVER_USAGE_DB";
const ENV_ROOT: &str = "SERVER_USAGE_ROOT";
const ENV_DATA_DIR: &str = "SERVER_USAGE_DATA_DIR";
const ENV_TABLE_PREFIX: &str = "SERVER_USAGE_TABLE_PREFIX";
const ENV_ADMIN_TOKEN: &str = "SERVER_USAGE_ADMIN_TOKEN";

pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn config_path_from_env() -> Option<PathBuf> {
    env_value(ENV_CONFIG).map(PathBuf::from)
}

/// Reads settings from `path` (defaults when the file is absent), then
/// applies environment overrides and validates the result.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<Settings>(&content)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        Some(path) => {
            log::warn!("config {} not found, using defaults", path.display());
            Settings::default()
        }
        None => Settings::default(),
    };

    apply_env_overrides(&mut settings)?;
    validate(&settings)?;
    Ok(settings)
}

pub fn apply_env_overrides(settings: &mut Settings) -> Result<()> {
    if let Some(host) = env_value(ENV_HOST) {
        settings.server.host = host;
    }
    if let Some(port) = env_value(ENV_PORT) {
        settings.server.port = port
            .parse()
            .with_context(|| format!("{} must be a port number, got `{}`", ENV_PORT, port))?;
    }
    if let Some(db) = env_value(ENV_DB) {
        settings.database.path = PathBuf::from(db);
    }
    if let Some(root) = env_value(ENV_ROOT) {
        settings.paths.root_directory = PathBuf::from(root);
    }
    if let Some(data) = env_value(ENV_DATA_DIR) {
        settings.paths.data_directory = PathBuf::from(data);
    }
    // an empty prefix is legitimate, so only the variable's presence matters
    if let Ok(prefix) = std::env::var(ENV_TABLE_PREFIX) {
        settings.database.table_prefix = prefix.trim().to_string();
    }
    if let Some(token) = env_value(ENV_ADMIN_TOKEN) {
        if !settings.auth.admin_tokens.contains(&token) {
            settings.auth.admin_tokens.push(token);
        }
    }
    Ok(())
}

pub fn validate(settings: &Settings) -> Result<()> {
    if !is_valid_table_prefix(&settings.database.table_prefix) {
        anyhow::bail!(
            "table prefix `{}` may only contain ASCII letters, digits and `_`",
            settings.database.table_prefix
        );
    }
    if settings.auth.admin_tokens.iter().any(|t| t.trim().is_empty()) {
        anyhow::bail!("admin tokens must not be blank");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::UnreadablePolicy;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        validate(&settings).unwrap();
        assert_eq!(settings.database.table_prefix, "wt_");
        assert_eq!(settings.paths.default_media_directory, "media/");
        assert_eq!(settings.usage.size_cache_ttl_secs, 60);
        assert_eq!(settings.usage.unreadable, UnreadablePolicy::Skip);
        assert!(!settings.usage.follow_symlinks);
        assert!(settings.auth.admin_tokens.is_empty());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{
                "version": "1.0.0",
                "database": { "path": "/srv/site/site.db", "table_prefix": "tree_" },
                "usage": {
                    "size_cache_ttl_secs": 5,
                    "report_timeout_secs": 0,
                    "unreadable": "abort"
                }
            }"#,
        )
        .unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.database.path, PathBuf::from("/srv/site/site.db"));
        assert_eq!(settings.usage.size_cache_ttl_secs, 5);
        assert_eq!(settings.usage.unreadable, UnreadablePolicy::Abort);
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn rejects_unsafe_prefix() {
        let mut settings = Settings::default();
        settings.database.table_prefix = "wt_; DROP TABLE".to_string();
        assert!(validate(&settings).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_settings(Some(&path)).is_err());
    }
}
