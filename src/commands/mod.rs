use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::models::{ModuleInfo, UsageReport};

pub mod server_usage;

pub use server_usage::ServerUsageModule;

pub const ADMIN_CONFIG_ACTION: &str = "admin_config";

#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    pub is_admin: bool,
    pub tree: Option<i64>,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Report { title: String, report: UsageReport },
    Forbidden,
    NotFound,
    /// The report could not be computed; nothing partial is shown.
    Unavailable { title: String, reason: String },
}

/// Capability surface the host needs from an admin module.
#[async_trait]
pub trait AdminModule: Send + Sync {
    fn name(&self) -> &str;

    fn title(&self) -> String;

    fn description(&self) -> String;

    fn config_link(&self) -> String {
        format!("/module/{}/{}", self.name(), ADMIN_CONFIG_ACTION)
    }

    fn info(&self) -> ModuleInfo {
        ModuleInfo {
            name: self.name().to_string(),
            title: self.title(),
            description: self.description(),
            config_link: self.config_link(),
        }
    }

    async fn handle_action(&self, action: &str, ctx: ActionContext) -> ActionOutcome;
}

#[derive(Default, Clone)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn AdminModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations under the same name replace earlier ones.
    pub fn register(&mut self, module: Arc<dyn AdminModule>) {
        self.modules.retain(|m| m.name() != module.name());
        self.modules.push(module);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AdminModule>> {
        self.modules.iter().find(|m| m.name() == name).cloned()
    }

    pub fn list(&self) -> Vec<ModuleInfo> {
        self.modules.iter().map(|m| m.info()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(&'static str);

    #[async_trait]
    impl AdminModule for Echo {
        fn name(&self) -> &str {
            self.0
        }

        fn title(&self) -> String {
            format!("Echo {}", self.0)
        }

        fn description(&self) -> String {
            String::new()
        }

        async fn handle_action(&self, _action: &str, _ctx: ActionContext) -> ActionOutcome {
            ActionOutcome::NotFound
        }
    }

    #[test]
    fn registry_lookup_and_replace() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(Echo("a")));
        registry.register(Arc::new(Echo("b")));
        registry.register(Arc::new(Echo("a")));

        assert!(registry.get("b").is_some());
        assert!(registry.get("c").is_none());

        let names: Vec<String> = registry.list().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn default_config_link_points_at_admin_action() {
        assert_eq!(Echo("x").config_link(), "/module/x/admin_config");
    }
}
