use std::fmt;
use tabnav_api::tab::{TabId, TabPage};

/// Identifies one embedded view.  Never reused, so events from a destroyed view can be recognized.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ViewId(pub u32);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// The navigation history held by an embedded view
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigationBuffer {
    pub history: Vec<TabPage>,
    pub current_index: usize,
}

impl NavigationBuffer {
    pub fn new(history: Vec<TabPage>, current_index: usize) -> Self {
        Self {
            history,
            current_index,
        }
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty() && self.current_index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.current_index + 1 < self.history.len()
    }

    pub fn current(&self) -> Option<&TabPage> {
        self.history.get(self.current_index)
    }
}

/// An event emitted by an embedded view.
///
/// Carried over the `NavBus`
///
/// Usage:
/// - Rx into the `NavigationService`, which reconciles the event into the tab registry.
/// - Tx from the embedded view implementation (e.g. the `HeadlessViewService`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewEvent {
    pub tab: TabId,
    pub view: ViewId,
    pub kind: ViewEventKind,
}

impl ViewEvent {
    pub fn new(tab: TabId, view: ViewId, kind: ViewEventKind) -> Self {
        Self { tab, view, kind }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEventKind {
    /// The page intends to navigate.  Not yet committed.
    WillNavigate { url: String },
    /// A main frame navigation was committed
    DidNavigate {
        url: String,
        buffer: NavigationBuffer,
    },
    /// An in-page (fragment / pushState) navigation was committed
    DidNavigateInPage {
        url: String,
        buffer: NavigationBuffer,
    },
    LoadCommit {
        url: String,
        main_frame: bool,
    },
    TitleUpdated(String),
    StartLoading,
    StopLoading { url: String },
    DomReady,
    /// The logical path declared by the page, answering `ViewAction::ResolvePath`
    PathResolved(String),
    Destroyed,
}

/// A command sent to the embedded view bound to a tab.
///
/// Carried over the `NavBus`
///
/// Usage:
/// - Tx from the `NavigationService`.
/// - Rx into the embedded view implementation.  Commands for a view that no longer exists are dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewCommand {
    pub tab: TabId,
    pub view: ViewId,
    pub action: ViewAction,
}

impl ViewCommand {
    pub fn new(tab: TabId, view: ViewId, action: ViewAction) -> Self {
        Self { tab, view, action }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewAction {
    Create { url: String },
    /// Replaces the view history, and navigates to the current index
    Replay(NavigationBuffer),
    GoToIndex(usize),
    LoadUrl(String),
    ResolvePath,
    Destroy,
}
