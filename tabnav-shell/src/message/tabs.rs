use tabnav_api::tab::TabId;

/// A tab command from the shell UI, received by the `NavigationService`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabsRecv {
    Open(OpenTab),
    Close(TabId),
    Focus(TabId),
    /// Loads a url in the tab, via its view if one is bound
    Navigate { tab: TabId, url: String },
    GoBack(TabId),
    GoForward(TabId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTab {
    pub id: TabId,
    pub url: Option<String>,
    /// Background tabs are opened sleepy, and not focused
    pub background: bool,
}

impl OpenTab {
    pub fn new<T: Into<String>>(url: T) -> Self {
        Self {
            id: TabId::generate(),
            url: Some(url.into()),
            background: false,
        }
    }
}

/// Signals that persisted tab state changed.  Triggers the debounced snapshot save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabsChanged;
