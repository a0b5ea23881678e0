use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque tab identifier.  Stable across restarts, as it is persisted in snapshots.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TabId(pub String);

impl TabId {
    pub fn new<T: Into<String>>(id: T) -> Self {
        TabId(id.into())
    }

    /// Generates a random identifier, which won't collide with restored ids.
    pub fn generate() -> Self {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();

        TabId(id)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for TabId {
    fn from(id: &str) -> Self {
        TabId(id.to_string())
    }
}

/// One visited location
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TabPage {
    /// url of the page, something like:
    ///   - itch://collections/:id
    ///   - itch://preferences
    ///   - https://leafo.itch.io/x-moon
    pub url: String,

    /// resource associated with the page, something like `games/:id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl TabPage {
    pub fn new<T: Into<String>>(url: T) -> Self {
        Self {
            url: url.into(),
            resource: None,
        }
    }

    pub fn with_resource<T: Into<String>, R: Into<String>>(url: T, resource: R) -> Self {
        Self {
            url: url.into(),
            resource: Some(resource.into()),
        }
    }
}

/// The navigation state of an open tab
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TabInstance {
    /// pages visited in this tab
    pub history: Vec<TabPage>,

    /// index of the history entry being shown
    pub current_index: usize,

    /// data for the current page - cleared on navigation
    pub data: TabData,

    /// if sleepy, the tab doesn't get a view until it's focused
    pub sleepy: bool,

    /// display title, usually reported by the page
    pub label: Option<String>,
}

impl TabInstance {
    pub fn with_page(page: TabPage) -> Self {
        Self {
            history: vec![page],
            ..Self::default()
        }
    }

    pub fn current_page(&self) -> Option<&TabPage> {
        self.history.get(self.current_index)
    }

    /// Records a new page, dropping any forward history.
    pub fn navigate(&mut self, page: TabPage) {
        if !self.history.is_empty() {
            self.history.truncate(self.current_index + 1);
        }

        self.history.push(page);
        self.current_index = self.history.len() - 1;
        self.clear_page();
    }

    /// Replaces the history & position, as reported by an embedded view.
    pub fn set_history(&mut self, history: Vec<TabPage>, current_index: usize) {
        self.history = history;
        self.current_index = current_index;
        self.clear_page();
        self.normalize();
    }

    /// Moves within the existing history.  Returns false if the index is out of range.
    pub fn go_to_index(&mut self, index: usize) -> bool {
        if index >= self.history.len() {
            return false;
        }

        self.current_index = index;
        self.clear_page();
        true
    }

    /// The label & data belong to the page that was showing
    pub fn clear_page(&mut self) {
        self.label = None;
        self.data = TabData::default();
    }

    /// Clamps the current index into the history bounds
    pub fn normalize(&mut self) {
        if self.history.is_empty() {
            self.current_index = 0;
        } else if self.current_index >= self.history.len() {
            self.current_index = self.history.len() - 1;
        }
    }

    pub fn is_consistent(&self) -> bool {
        if self.history.is_empty() {
            self.current_index == 0
        } else {
            self.current_index < self.history.len()
        }
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty() && self.current_index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.current_index + 1 < self.history.len()
    }

    /// The display label, falling back to the url of the current page
    pub fn label(&self) -> Option<String> {
        self.label
            .clone()
            .or_else(|| self.current_page().map(|page| page.url.clone()))
    }
}

/// Transient data for the current page.  Never persisted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TabData {
    pub web: Option<TabWeb>,
    pub location: Option<TabLocation>,
    pub toast: Option<TabToast>,
    pub log: Option<TabLog>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TabWeb {
    /// identifier of the embedded view showing the page
    pub view_id: Option<u32>,
    pub title: Option<String>,
    pub favicon: Option<String>,
    pub editing_address: bool,
    pub loading: bool,
}

/// The logical path of the page, which may differ from the url
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TabLocation {
    pub path: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TabToast {
    pub error: Option<String>,
    pub stack: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TabLog {
    pub log: String,
}

/// The persisted projection of a `TabInstance`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabDataSave {
    pub id: TabId,
    #[serde(default)]
    pub history: Vec<TabPage>,
    #[serde(default)]
    pub current_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleepy: Option<bool>,
}

impl TabDataSave {
    pub fn from_instance(id: &TabId, instance: &TabInstance) -> Self {
        Self {
            id: id.clone(),
            history: instance.history.clone(),
            current_index: instance.current_index,
            saved_label: instance.label(),
            sleepy: None,
        }
    }

    /// Converts the saved entry back into a registry instance.
    /// Stored values come from disk, so the index is clamped.
    pub fn into_instance(self) -> (TabId, TabInstance) {
        let mut instance = TabInstance {
            history: self.history,
            current_index: self.current_index,
            data: TabData::default(),
            sleepy: self.sleepy.unwrap_or(false),
            label: self.saved_label,
        };
        instance.normalize();

        (self.id, instance)
    }
}
