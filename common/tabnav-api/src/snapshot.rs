use crate::tab::{TabDataSave, TabId};
use serde::{Deserialize, Serialize};

/// The profile data key which holds the tab snapshot
pub const TABS_KEY: &str = "@itch/tabs";

/// The persisted set of open tabs, for a single profile.
/// Replaced wholesale on each save.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub current: TabId,
    pub items: Vec<TabDataSave>,
}

impl Snapshot {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(value: &str) -> Result<Snapshot, serde_json::Error> {
        serde_json::from_str(value)
    }

    pub fn contains(&self, id: &TabId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    pub fn ids(&self) -> Vec<TabId> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }
}
