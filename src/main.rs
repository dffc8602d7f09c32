use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use server_usage::commands::{
    ActionContext, ActionOutcome, AdminModule, ModuleRegistry, ServerUsageModule,
    ADMIN_CONFIG_ACTION,
};
use server_usage::server::render::UsageView;
use server_usage::server::{AppState, TokenAuth, UsageServer};
use server_usage::{database, utils};

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::config::load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = arg_value(&args, "--config")
        .map(PathBuf::from)
        .or_else(utils::config::config_path_from_env);
    let settings = utils::config::load_settings(config_path.as_deref())?;

    if args.iter().any(|a| a == "--init-db") {
        database::init_database(&settings.database.path, &settings.database.table_prefix)
            .with_context(|| format!("initializing {}", settings.database.path.display()))?;
        log::info!("initialized {}", settings.database.path.display());
    }

    let module = ServerUsageModule::from_settings(&settings)?;

    if args.iter().any(|a| a == "--report") {
        let tree = arg_value(&args, "--tree")
            .map(|t| t.parse::<i64>())
            .transpose()
            .context("--tree expects a numeric tree id")?;
        // the command line is trusted like an administrator
        let ctx = ActionContext {
            is_admin: true,
            tree,
            cancel: CancellationToken::new(),
        };
        return match module.handle_action(ADMIN_CONFIG_ACTION, ctx).await {
            ActionOutcome::Report { report, .. } => {
                println!("{}", serde_json::to_string_pretty(&UsageView::from(&report))?);
                Ok(())
            }
            ActionOutcome::Unavailable { reason, .. } => {
                anyhow::bail!("usage unavailable: {}", reason)
            }
            other => anyhow::bail!("unexpected outcome: {:?}", other),
        };
    }

    if settings.auth.admin_tokens.is_empty() {
        log::warn!("no admin tokens configured; every module action will be refused");
    }

    let mut registry = ModuleRegistry::new();
    registry.register(Arc::new(module));

    let state = AppState {
        registry,
        auth: Arc::new(TokenAuth::new(settings.auth.admin_tokens.clone())),
        display_precision: settings.usage.display_precision,
        shutdown: CancellationToken::new(),
    };

    UsageServer::new(settings.server.host.clone(), settings.server.port, state)
        .start()
        .await
}
