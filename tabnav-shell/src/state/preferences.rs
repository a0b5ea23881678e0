use tabnav_api::config::Config;

/// User preferences consumed by the navigation services
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preferences {
    /// Multi-tab mode.  When disabled, restore keeps only the first saved tab.
    pub enable_tabs: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self { enable_tabs: true }
    }
}

impl From<&Config> for Preferences {
    fn from(config: &Config) -> Self {
        Self {
            enable_tabs: config.tabs.enabled,
        }
    }
}
