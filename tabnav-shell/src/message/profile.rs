use tabnav_api::{
    profile::{Profile, ProfileId},
    snapshot::Snapshot,
    tab::TabId,
};

/// A profile lifecycle event, received by the `RestoreService`.
///
/// Carried over the `NavBus`
///
/// Usage:
/// - Rx into the `RestoreService`, which publishes the active profile & restores its tabs.
/// - Tx from the `MainService`, when the cli selects a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileRecv {
    Loaded(Profile),
    LoggedOut,
}

/// A validated snapshot, published once per successful restore.
///
/// Usage:
/// - Rx into the `NavigationService`, which replaces the open tabs.
/// - Tx from the `RestoreService`.
#[derive(Debug, Clone, PartialEq)]
pub struct TabsRestored(pub Snapshot);

/// Sent after a restore attempt completes, whether or not tabs were restored.
/// `current` is the restored current tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreFinished {
    pub profile: ProfileId,
    pub current: Option<TabId>,
}
