use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{ActionContext, ActionOutcome, AdminModule, ADMIN_CONFIG_ACTION};
use crate::database::{SqliteStore, UsageStore};
use crate::models::{PathSettings, Settings};
use crate::services::{DatabaseSizeCalculator, DirectorySizeCalculator, UsageReportBuilder};

pub const MODULE_NAME: &str = "server_usage";

pub struct ServerUsageModule {
    builder: UsageReportBuilder,
    paths: PathSettings,
    default_tree: Option<i64>,
}

impl ServerUsageModule {
    pub fn new(
        builder: UsageReportBuilder,
        paths: PathSettings,
        default_tree: Option<i64>,
    ) -> Self {
        Self {
            builder,
            paths,
            default_tree,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let store: Arc<dyn UsageStore> = Arc::new(SqliteStore::new(
            settings.database.path.clone(),
            settings.database.table_prefix.clone(),
        )?);
        Ok(Self::with_store(store, settings))
    }

    pub fn with_store(store: Arc<dyn UsageStore>, settings: &Settings) -> Self {
        let usage = &settings.usage;
        let database_size = Arc::new(DatabaseSizeCalculator::new(
            store.clone(),
            Duration::from_secs(usage.size_cache_ttl_secs),
        ));
        let directories = DirectorySizeCalculator::new(usage.unreadable, usage.follow_symlinks);
        let builder = UsageReportBuilder::new(store, database_size, directories)
            .with_timeout(Some(Duration::from_secs(usage.report_timeout_secs)));

        Self::new(builder, settings.paths.clone(), usage.default_tree)
    }

    pub fn page_title(&self) -> String {
        "Server usage".to_string()
    }

    async fn admin_config(&self, ctx: ActionContext) -> ActionOutcome {
        if !ctx.is_admin {
            return ActionOutcome::Forbidden;
        }

        let tree = ctx.tree.or(self.default_tree);
        let paths = match self
            .builder
            .resolve_paths(
                &self.paths.root_directory,
                &self.paths.data_directory,
                &self.paths.default_media_directory,
                tree,
                &ctx.cancel,
            )
            .await
        {
            Ok(paths) => paths,
            Err(err) => return self.unavailable(err),
        };

        log::info!(
            "computing server usage (root={}, media={})",
            paths.root_directory.display(),
            paths.media_directory.display()
        );

        match self.builder.build(&paths, &ctx.cancel).await {
            Ok(report) => ActionOutcome::Report {
                title: self.page_title(),
                report,
            },
            Err(err) => self.unavailable(err),
        }
    }

    fn unavailable(&self, err: impl std::fmt::Display) -> ActionOutcome {
        log::error!("server usage unavailable: {}", err);
        ActionOutcome::Unavailable {
            title: self.page_title(),
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl AdminModule for ServerUsageModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn title(&self) -> String {
        "Server Usage".to_string()
    }

    fn description(&self) -> String {
        "Allows you to easily check the usage of disk space and database size on the server."
            .to_string()
    }

    async fn handle_action(&self, action: &str, ctx: ActionContext) -> ActionOutcome {
        match action {
            ADMIN_CONFIG_ACTION => self.admin_config(ctx).await,
            _ => ActionOutcome::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::init_database;
    use std::fs::{self, File};

    fn fixture() -> (tempfile::TempDir, Settings) {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("data");
        fs::create_dir_all(data.join("media")).unwrap();
        File::create(data.join("media").join("photo.jpg")).unwrap().set_len(2048).unwrap();
        File::create(root.path().join("index.php")).unwrap().set_len(1024).unwrap();

        let mut settings = Settings::default();
        settings.paths.root_directory = root.path().to_path_buf();
        settings.paths.data_directory = data.clone();
        settings.database.path = data.join("site.db");

        let conn = init_database(&settings.database.path, "wt_").unwrap();
        conn.execute("INSERT INTO wt_gedcom (gedcom_id, gedcom_name) VALUES (1, 'demo')", [])
            .unwrap();
        conn.execute("INSERT INTO wt_individuals (i_id, i_file) VALUES ('I1', 1)", []).unwrap();
        (root, settings)
    }

    fn admin() -> ActionContext {
        ActionContext {
            is_admin: true,
            ..ActionContext::default()
        }
    }

    #[tokio::test]
    async fn admin_gets_report() {
        let (_root, settings) = fixture();
        let module = ServerUsageModule::from_settings(&settings).unwrap();

        match module.handle_action(ADMIN_CONFIG_ACTION, admin()).await {
            ActionOutcome::Report { title, report } => {
                assert_eq!(title, "Server usage");
                assert_eq!(report.individual_count, 1);
                assert_eq!(report.media_count, 0);
                assert_eq!(report.media_directory_size_mb, 2048.0 / 1_048_576.0);
                assert!(report.root_directory_size_mb > report.media_directory_size_mb);
                assert!(report.database_size_mb > 0.0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn registry_entry_describes_the_module() {
        let (_root, settings) = fixture();
        let info = ServerUsageModule::from_settings(&settings).unwrap().info();
        assert_eq!(info.name, "server_usage");
        assert_eq!(info.title, "Server Usage");
        assert_eq!(info.config_link, "/module/server_usage/admin_config");
    }

    #[tokio::test]
    async fn non_admin_is_refused() {
        let (_root, settings) = fixture();
        let module = ServerUsageModule::from_settings(&settings).unwrap();
        let outcome = module
            .handle_action(ADMIN_CONFIG_ACTION, ActionContext::default())
            .await;
        assert_eq!(outcome, ActionOutcome::Forbidden);
    }

    #[tokio::test]
    async fn unknown_action_is_not_found() {
        let (_root, settings) = fixture();
        let module = ServerUsageModule::from_settings(&settings).unwrap();
        assert_eq!(module.handle_action("delete_all", admin()).await, ActionOutcome::NotFound);
    }

    #[tokio::test]
    async fn broken_database_is_unavailable() {
        let (root, mut settings) = fixture();
        settings.database.path = root.path().join("elsewhere").join("missing.db");
        let module = ServerUsageModule::from_settings(&settings).unwrap();
        assert!(matches!(
            module.handle_action(ADMIN_CONFIG_ACTION, admin()).await,
            ActionOutcome::Unavailable { .. }
        ));
    }
}
