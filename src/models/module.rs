use serde::{Deserialize, Serialize};

/// What the control panel lists for a registered module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
    pub title: String,
    pub description: String,
    pub config_link: String,
}
