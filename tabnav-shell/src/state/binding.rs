//! Binds embedded views to tabs, and mirrors view navigation into the tab registry.
//!
//! A tab is either unbound (no entry in `ViewBindings`) or bound to exactly one `ViewId`.
//! Views are created on the restore sentinel, and their first commit pulls the saved history back in.
use super::{instances::TabPatch, navigation::NavigationState};
use crate::message::view::{NavigationBuffer, ViewAction, ViewCommand, ViewEvent, ViewEventKind, ViewId};
use log::{debug, trace, warn};
use std::collections::HashMap;
use tabnav_api::tab::{TabId, TabLocation, TabPage, TabWeb};

/// The url a fresh view is created on.  Committing it replays the saved history.
pub const RESTORE_SENTINEL: &str = "about:blank";

pub fn is_restore_sentinel(url: &str) -> bool {
    url.starts_with(RESTORE_SENTINEL)
}

/// The live state of a bound view, as shown in the tab's address bar
#[derive(Clone, Debug, PartialEq)]
pub struct ViewBinding {
    pub view: ViewId,
    /// the tentative url, which may not be committed to history yet
    pub url: String,
    pub title: String,
    pub loading: bool,
    pub dom_ready: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    /// the logical path of the page, once resolved
    pub path: Option<String>,
}

impl ViewBinding {
    fn new(view: ViewId) -> Self {
        Self {
            view,
            url: RESTORE_SENTINEL.to_string(),
            title: String::new(),
            loading: false,
            dom_ready: false,
            can_go_back: false,
            can_go_forward: false,
            path: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewBindings {
    bindings: HashMap<TabId, ViewBinding>,
    next_view: u32,
}

impl ViewBindings {
    pub fn get(&self, tab: &TabId) -> Option<&ViewBinding> {
        self.bindings.get(tab)
    }

    pub fn is_bound(&self, tab: &TabId) -> bool {
        self.bindings.contains_key(tab)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn tabs(&self) -> Vec<TabId> {
        self.bindings.keys().cloned().collect()
    }

    fn bind(&mut self, tab: &TabId) -> ViewId {
        let view = ViewId(self.next_view);
        self.next_view += 1;

        self.bindings.insert(tab.clone(), ViewBinding::new(view));
        view
    }

    fn unbind(&mut self, tab: &TabId) -> Option<ViewBinding> {
        self.bindings.remove(tab)
    }

    /// The binding, if the tab is still bound to this view
    fn bound_mut(&mut self, tab: &TabId, view: ViewId) -> Option<&mut ViewBinding> {
        self.bindings
            .get_mut(tab)
            .filter(|binding| binding.view == view)
    }
}

/// The outcome of a reconciliation step
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reconciled {
    /// Commands for the embedded views
    pub commands: Vec<ViewCommand>,
    /// Whether persisted tab state changed
    pub changed: bool,
}

impl Reconciled {
    fn command(command: ViewCommand) -> Self {
        Self {
            commands: vec![command],
            changed: false,
        }
    }

    fn changed() -> Self {
        Self {
            commands: vec![],
            changed: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Reconciler {
    scheme_prefix: String,
}

impl Reconciler {
    pub fn new(internal_scheme: &str) -> Self {
        Self {
            scheme_prefix: format!("{}://", internal_scheme),
        }
    }

    /// Binds a view to the visible tab, and releases the views of every other tab.
    pub fn reconcile(&self, state: &mut NavigationState) -> Vec<ViewCommand> {
        let visible = state.visible_tab().cloned();
        let mut commands = Vec::new();

        for tab in state.views.tabs() {
            if Some(&tab) == visible.as_ref() {
                continue;
            }

            if let Some(binding) = state.views.unbind(&tab) {
                debug!("releasing {} from tab {}", binding.view, tab);
                commands.push(ViewCommand::new(tab, binding.view, ViewAction::Destroy));
            }
        }

        if let Some(tab) = visible {
            if !state.views.is_bound(&tab) {
                let view = state.views.bind(&tab);
                debug!("binding {} to tab {}", view, tab);

                if let Some(web) = web_mut(state, &tab) {
                    web.view_id = Some(view.0);
                }

                let create = ViewAction::Create {
                    url: RESTORE_SENTINEL.to_string(),
                };
                commands.push(ViewCommand::new(tab, view, create));
            }
        }

        commands
    }

    /// Releases every view binding
    pub fn unbind_all(&self, state: &mut NavigationState) -> Vec<ViewCommand> {
        state
            .views
            .tabs()
            .into_iter()
            .filter_map(|tab| {
                state
                    .views
                    .unbind(&tab)
                    .map(|binding| ViewCommand::new(tab, binding.view, ViewAction::Destroy))
            })
            .collect()
    }

    /// Mirrors a view event into the navigation state.
    ///
    /// Events from a view which is no longer bound to the tab are ignored.
    pub fn handle(&self, state: &mut NavigationState, event: ViewEvent) -> Reconciled {
        let ViewEvent { tab, view, kind } = event;

        let binding = match state.views.bound_mut(&tab, view) {
            Some(binding) => binding,
            None => {
                trace!("no live binding of {} to tab {}, skipping {:?}", view, tab, kind);
                return Reconciled::default();
            }
        };

        match kind {
            ViewEventKind::WillNavigate { url } => {
                binding.url = url;
                Reconciled::default()
            }
            ViewEventKind::DidNavigate { url, buffer }
            | ViewEventKind::DidNavigateInPage { url, buffer }
                if is_restore_sentinel(url.as_str()) =>
            {
                let saved = state
                    .instances
                    .get(&tab)
                    .filter(|instance| !instance.history.is_empty())
                    .map(|instance| {
                        NavigationBuffer::new(instance.history.clone(), instance.current_index)
                    });

                match saved {
                    Some(saved) => {
                        debug!(
                            "replaying {} pages into {} (view had {})",
                            saved.history.len(),
                            view,
                            buffer.history.len()
                        );
                        Reconciled::command(ViewCommand::new(tab, view, ViewAction::Replay(saved)))
                    }
                    None => Reconciled::default(),
                }
            }
            ViewEventKind::DidNavigate { url, buffer }
            | ViewEventKind::DidNavigateInPage { url, buffer } => {
                binding.url = url;
                binding.can_go_back = buffer.can_go_back();
                binding.can_go_forward = buffer.can_go_forward();
                binding.path = None;

                state
                    .instances
                    .upsert(&tab, TabPatch::history(buffer.history, buffer.current_index));

                if let Some(web) = web_mut(state, &tab) {
                    web.view_id = Some(view.0);
                }

                Reconciled::changed()
            }
            ViewEventKind::LoadCommit { url, main_frame } => {
                if main_frame {
                    binding.url = url;
                }

                Reconciled::default()
            }
            ViewEventKind::TitleUpdated(title) => {
                binding.title = title.clone();

                if title.is_empty() {
                    return Reconciled::default();
                }

                state.instances.upsert(&tab, TabPatch::label(title.as_str()));
                if let Some(web) = web_mut(state, &tab) {
                    web.title = Some(title);
                }

                Reconciled::changed()
            }
            ViewEventKind::StartLoading => {
                binding.loading = true;
                if let Some(web) = web_mut(state, &tab) {
                    web.loading = true;
                }

                Reconciled::default()
            }
            ViewEventKind::StopLoading { url } => {
                binding.loading = false;

                let internal_path = url
                    .strip_prefix(self.scheme_prefix.as_str())
                    .map(str::to_string);

                if let Some(ref path) = internal_path {
                    binding.path = Some(path.clone());
                }

                if let Some(web) = web_mut(state, &tab) {
                    web.loading = false;
                }

                if is_restore_sentinel(url.as_str()) {
                    return Reconciled::default();
                }

                match internal_path {
                    Some(path) => {
                        set_location(state, &tab, path);
                        Reconciled::default()
                    }
                    None => {
                        Reconciled::command(ViewCommand::new(tab, view, ViewAction::ResolvePath))
                    }
                }
            }
            ViewEventKind::DomReady => {
                binding.dom_ready = true;
                Reconciled::default()
            }
            ViewEventKind::PathResolved(path) => {
                if path.is_empty() {
                    binding.path = None;
                    return Reconciled::default();
                }

                binding.path = Some(path.clone());
                set_location(state, &tab, path);
                Reconciled::default()
            }
            ViewEventKind::Destroyed => {
                debug!("{} destroyed, tab {} is unbound", view, tab);
                state.views.unbind(&tab);
                Reconciled::default()
            }
        }
    }

    /// Loads a url in the tab.
    /// A bound view navigates itself, an unbound tab records the page directly.
    pub fn load_url(&self, state: &mut NavigationState, tab: &TabId, url: String) -> Reconciled {
        if let Some(binding) = state.views.get(tab) {
            if !binding.dom_ready {
                warn!("{} not ready yet, ignoring: {}", binding.view, url);
                return Reconciled::default();
            }

            let command = ViewCommand::new(tab.clone(), binding.view, ViewAction::LoadUrl(url));
            return Reconciled::command(command);
        }

        if state.navigate(tab, TabPage::new(url)) {
            Reconciled::changed()
        } else {
            Reconciled::default()
        }
    }

    pub fn go_back(&self, state: &mut NavigationState, tab: &TabId) -> Reconciled {
        self.go_by(state, tab, -1)
    }

    pub fn go_forward(&self, state: &mut NavigationState, tab: &TabId) -> Reconciled {
        self.go_by(state, tab, 1)
    }

    fn go_by(&self, state: &mut NavigationState, tab: &TabId, offset: isize) -> Reconciled {
        let target = match state.instances.get(tab) {
            Some(instance) => instance.current_index as isize + offset,
            None => return Reconciled::default(),
        };

        let len = state.instances.get(tab).map(|i| i.history.len()).unwrap_or(0);
        if target < 0 || target as usize >= len {
            return Reconciled::default();
        }

        let target = target as usize;
        if let Some(binding) = state.views.get(tab) {
            let command = ViewCommand::new(tab.clone(), binding.view, ViewAction::GoToIndex(target));
            return Reconciled::command(command);
        }

        if state.go_to_index(tab, target) {
            Reconciled::changed()
        } else {
            Reconciled::default()
        }
    }
}

fn web_mut<'a>(state: &'a mut NavigationState, tab: &TabId) -> Option<&'a mut TabWeb> {
    state
        .instances
        .get_mut(tab)
        .map(|instance| instance.data.web.get_or_insert_with(TabWeb::default))
}

fn set_location(state: &mut NavigationState, tab: &TabId, path: String) {
    if let Some(instance) = state.instances.get_mut(tab) {
        instance.data.location = Some(TabLocation { path });
    }
}
