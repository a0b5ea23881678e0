use super::{binding::ViewBindings, instances::TabInstances};
use crate::message::tabs::OpenTab;
use tabnav_api::{
    snapshot::Snapshot,
    tab::{TabDataSave, TabId, TabInstance, TabPage},
};

/// The shell's navigation state: the open tabs in display order, the current tab,
/// the instance registry, and the live view bindings.
///
/// Owned by the `NavigationService`, and published as `Option<NavigationState>`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavigationState {
    pub current: Option<TabId>,
    pub open: Vec<TabId>,
    pub instances: TabInstances,
    pub views: ViewBindings,
}

impl NavigationState {
    pub fn is_open(&self, id: &TabId) -> bool {
        self.open.contains(id)
    }

    pub fn current_instance(&self) -> Option<&TabInstance> {
        self.current.as_ref().and_then(|id| self.instances.get(id))
    }

    /// The tab which should have a view: the current tab, once awake.
    pub fn visible_tab(&self) -> Option<&TabId> {
        let current = self.current.as_ref()?;
        let instance = self.instances.get(current)?;

        if instance.sleepy {
            None
        } else {
            Some(current)
        }
    }

    /// Opens a tab.  Returns false if the tab was already open.
    pub fn open_tab(&mut self, open: &OpenTab) -> bool {
        if self.is_open(&open.id) {
            if !open.background {
                self.focus(&open.id);
            }

            return false;
        }

        let mut instance = open
            .url
            .as_ref()
            .map(|url| TabInstance::with_page(TabPage::new(url.as_str())))
            .unwrap_or_default();
        instance.sleepy = open.background;

        self.instances.insert(open.id.clone(), instance);
        self.open.push(open.id.clone());

        if !open.background || self.current.is_none() {
            self.focus(&open.id);
        }

        true
    }

    /// Closes the tab, and drops its instance.
    /// If it was current, focus moves to the next tab, or the previous one if it was last.
    pub fn close_tab(&mut self, id: &TabId) -> bool {
        let position = match self.open.iter().position(|open| open == id) {
            Some(position) => position,
            None => return false,
        };

        self.open.remove(position);
        self.instances.remove(id);

        if self.current.as_ref() == Some(id) {
            let neighbour = self
                .open
                .get(position)
                .or_else(|| position.checked_sub(1).and_then(|prev| self.open.get(prev)))
                .cloned();

            self.current = None;
            if let Some(neighbour) = neighbour {
                self.focus(&neighbour);
            }
        }

        true
    }

    /// Focuses the tab, waking it if it was sleepy.
    pub fn focus(&mut self, id: &TabId) -> bool {
        if !self.is_open(id) {
            return false;
        }

        self.current = Some(id.clone());
        if let Some(instance) = self.instances.get_mut(id) {
            instance.sleepy = false;
        }

        true
    }

    /// Records a page in the tab's history, without a view.
    pub fn navigate(&mut self, id: &TabId, page: TabPage) -> bool {
        match self.instances.get_mut(id) {
            Some(instance) => {
                instance.navigate(page);
                true
            }
            None => false,
        }
    }

    pub fn go_to_index(&mut self, id: &TabId, index: usize) -> bool {
        self.instances
            .get_mut(id)
            .map(|instance| instance.go_to_index(index))
            .unwrap_or(false)
    }

    /// Replaces the open tabs with a validated snapshot.
    /// Tabs other than the current one are restored sleepy.
    ///
    /// View bindings must be released before the restore.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.open.clear();
        self.instances.clear();

        let current = snapshot.current;
        for item in snapshot.items {
            let (id, mut instance) = item.into_instance();
            instance.sleepy = id != current;

            if self.is_open(&id) {
                continue;
            }

            self.open.push(id.clone());
            self.instances.insert(id, instance);
        }

        self.current = if self.is_open(&current) {
            Some(current)
        } else {
            self.open.first().cloned()
        };
    }

    /// Builds the persisted snapshot of the open tabs.
    /// Open tabs without an instance are skipped.
    pub fn capture(&self) -> Snapshot {
        let items = self
            .open
            .iter()
            .filter_map(|id| {
                self.instances
                    .get(id)
                    .map(|instance| TabDataSave::from_instance(id, instance))
            })
            .collect();

        Snapshot {
            current: self.current.clone().unwrap_or_default(),
            items,
        }
    }
}
