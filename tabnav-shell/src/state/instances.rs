use std::collections::{hash_map, HashMap};
use tabnav_api::tab::{TabData, TabId, TabInstance, TabPage};

/// A partial update to a `TabInstance`.  `None` fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TabPatch {
    pub history: Option<Vec<TabPage>>,
    pub current_index: Option<usize>,
    pub label: Option<String>,
    pub data: Option<TabData>,
    pub sleepy: Option<bool>,
}

impl TabPatch {
    /// A history & position update, which also clears the page label & data
    pub fn history(history: Vec<TabPage>, current_index: usize) -> Self {
        Self {
            history: Some(history),
            current_index: Some(current_index),
            data: Some(TabData::default()),
            ..Self::default()
        }
    }

    pub fn label<T: Into<String>>(label: T) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn sleepy(sleepy: bool) -> Self {
        Self {
            sleepy: Some(sleepy),
            ..Self::default()
        }
    }
}

/// The tab instance registry.  The sole owner of each tab's navigation state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TabInstances {
    instances: HashMap<TabId, TabInstance>,
}

impl TabInstances {
    pub fn get(&self, id: &TabId) -> Option<&TabInstance> {
        self.instances.get(id)
    }

    /// Mutable access, for in-place updates that preserve the index invariant
    pub(crate) fn get_mut(&mut self, id: &TabId) -> Option<&mut TabInstance> {
        self.instances.get_mut(id)
    }

    pub fn contains(&self, id: &TabId) -> bool {
        self.instances.contains_key(id)
    }

    /// Merges the patch into the instance, creating it if absent.
    pub fn upsert(&mut self, id: &TabId, patch: TabPatch) -> &TabInstance {
        let instance = self.instances.entry(id.clone()).or_default();

        if let Some(history) = patch.history {
            instance.history = history;
            instance.label = None;
        }

        if let Some(index) = patch.current_index {
            instance.current_index = index;
        }

        if let Some(label) = patch.label {
            instance.label = Some(label);
        }

        if let Some(data) = patch.data {
            instance.data = data;
        }

        if let Some(sleepy) = patch.sleepy {
            instance.sleepy = sleepy;
        }

        instance.normalize();
        instance
    }

    pub fn insert(&mut self, id: TabId, mut instance: TabInstance) {
        instance.normalize();
        self.instances.insert(id, instance);
    }

    pub fn remove(&mut self, id: &TabId) -> Option<TabInstance> {
        self.instances.remove(id)
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, TabId, TabInstance> {
        self.instances.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{TabInstances, TabPatch};
    use tabnav_api::tab::{TabData, TabId, TabLog, TabPage};

    fn pages(urls: &[&str]) -> Vec<TabPage> {
        urls.iter().map(|url| TabPage::new(*url)).collect()
    }

    fn assert_consistent(instances: &TabInstances) {
        for (id, instance) in instances.iter() {
            assert!(
                instance.is_consistent(),
                "tab {} has index {} with {} pages",
                id,
                instance.current_index,
                instance.history.len()
            );
        }
    }

    #[test]
    fn upsert_creates() {
        let mut instances = TabInstances::default();
        let id = TabId::new("a");

        instances.upsert(&id, TabPatch::history(pages(&["x", "y"]), 1));

        let instance = instances.get(&id).unwrap();
        assert_eq!(pages(&["x", "y"]), instance.history);
        assert_eq!(1, instance.current_index);
        assert_consistent(&instances);
    }

    #[test]
    fn upsert_merges() {
        let mut instances = TabInstances::default();
        let id = TabId::new("a");

        instances.upsert(&id, TabPatch::history(pages(&["x"]), 0));
        instances.upsert(&id, TabPatch::label("Label"));

        let instance = instances.get(&id).unwrap();
        assert_eq!(pages(&["x"]), instance.history);
        assert_eq!(Some("Label".to_string()), instance.label);
    }

    #[test]
    fn history_patch_clears_label() {
        let mut instances = TabInstances::default();
        let id = TabId::new("a");

        instances.upsert(&id, TabPatch::history(pages(&["x"]), 0));
        instances.upsert(&id, TabPatch::label("Label"));
        instances.upsert(&id, TabPatch::history(pages(&["x", "y"]), 1));

        let instance = instances.get(&id).unwrap();
        assert_eq!(None, instance.label);
        assert_eq!(Some("y".to_string()), instance.label());
    }

    #[test]
    fn upsert_clamps_index() {
        let mut instances = TabInstances::default();
        let id = TabId::new("a");

        instances.upsert(&id, TabPatch::history(pages(&["x", "y", "z"]), 2));
        instances.upsert(
            &id,
            TabPatch {
                history: Some(pages(&["x"])),
                ..TabPatch::default()
            },
        );
        assert_eq!(0, instances.get(&id).unwrap().current_index);

        instances.upsert(
            &id,
            TabPatch {
                current_index: Some(9),
                ..TabPatch::default()
            },
        );
        assert_eq!(0, instances.get(&id).unwrap().current_index);
        assert_consistent(&instances);
    }

    #[test]
    fn history_patch_clears_data() {
        let mut instances = TabInstances::default();
        let id = TabId::new("a");

        instances.upsert(
            &id,
            TabPatch {
                data: Some(TabData {
                    log: Some(TabLog { log: "log".into() }),
                    ..TabData::default()
                }),
                ..TabPatch::default()
            },
        );
        assert!(instances.get(&id).unwrap().data.log.is_some());

        instances.upsert(&id, TabPatch::history(pages(&["x"]), 0));
        assert_eq!(TabData::default(), instances.get(&id).unwrap().data);
    }

    #[test]
    fn remove_drops() {
        let mut instances = TabInstances::default();
        let id = TabId::new("a");

        instances.upsert(&id, TabPatch::sleepy(true));
        assert!(instances.remove(&id).is_some());
        assert!(instances.get(&id).is_none());
        assert!(instances.remove(&id).is_none());
    }
}
