use crate::{
    message::profile::{ProfileRecv, RestoreFinished, TabsRestored},
    prelude::*,
    state::preferences::Preferences,
    store::{SnapshotError, SnapshotStore},
};
use tabnav_api::{
    profile::{Profile, ProfileId},
    snapshot::Snapshot,
    tab::TabId,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("saved current tab {0} is not among the saved tabs")]
    DanglingCurrentTab(TabId),
}

/// Loads the profile's last snapshot, and checks it can be restored.
pub async fn restore(
    store: &SnapshotStore,
    profile: ProfileId,
    enable_tabs: bool,
) -> Result<Snapshot, RestoreError> {
    let snapshot = store.load(profile).await?;
    validate(snapshot, enable_tabs)
}

/// Keeps only the first tab in single-tab mode, and requires the current tab to be present.
pub fn validate(mut snapshot: Snapshot, enable_tabs: bool) -> Result<Snapshot, RestoreError> {
    if !enable_tabs {
        snapshot.items.truncate(1);
    }

    if !snapshot.contains(&snapshot.current) {
        return Err(RestoreError::DanglingCurrentTab(snapshot.current));
    }

    Ok(snapshot)
}

/// Publishes the active profile, and restores its tabs when it is loaded.
pub struct RestoreService {
    _profile: Lifeline,
}

impl Service for RestoreService {
    type Bus = NavBus;
    type Lifeline = anyhow::Result<Self>;

    fn spawn(bus: &Self::Bus) -> Self::Lifeline {
        let store = bus.resource::<SnapshotStore>()?;

        let mut rx = bus.rx::<ProfileRecv>()?;
        let rx_preferences = bus.rx::<Preferences>()?;

        let mut tx_profile = bus.tx::<Option<Profile>>()?;
        let mut tx_restored = bus.tx::<TabsRestored>()?;
        let mut tx_finished = bus.tx::<RestoreFinished>()?;

        let _profile = Self::try_task("profile", async move {
            while let Some(msg) = rx.recv().await {
                match msg {
                    ProfileRecv::Loaded(profile) => {
                        info!("profile {} loaded ({})", profile.id, profile.username);
                        let id = profile.id;
                        tx_profile.send(Some(profile)).await?;

                        let enable_tabs = rx_preferences.borrow().enable_tabs;
                        let current = match restore(&store, id, enable_tabs).await {
                            Ok(snapshot) => {
                                let current = snapshot.current.clone();
                                tx_restored.send(TabsRestored(snapshot)).await?;
                                Some(current)
                            }
                            Err(RestoreError::Snapshot(SnapshotError::NotFound(_))) => {
                                info!("no tabs to restore for profile {}", id);
                                None
                            }
                            Err(RestoreError::DanglingCurrentTab(tab)) => {
                                trace!("dropping snapshot with dangling current tab {}", tab);
                                None
                            }
                            Err(e) => {
                                warn!("could not retrieve saved tabs: {}", e);
                                None
                            }
                        };

                        tx_finished
                            .send(RestoreFinished {
                                profile: id,
                                current,
                            })
                            .await?;
                    }
                    ProfileRecv::LoggedOut => {
                        info!("profile logged out");
                        tx_profile.send(None).await?;
                    }
                }
            }

            Ok(())
        });

        Ok(Self { _profile })
    }
}

#[cfg(test)]
mod tests {
    use super::{validate, RestoreError, RestoreService};
    use crate::{
        message::profile::{ProfileRecv, RestoreFinished, TabsRestored},
        prelude::*,
        state::preferences::Preferences,
        store::SnapshotStore,
    };
    use lifeline::{assert_completes, assert_times_out, dyn_bus::DynBus};
    use pretty_assertions::assert_eq;
    use tabnav_api::{
        profile::{MemoryProfileData, Profile, ProfileData, ProfileId},
        snapshot::{Snapshot, TABS_KEY},
        tab::{TabDataSave, TabId, TabPage},
    };

    fn item(id: &str) -> TabDataSave {
        TabDataSave {
            id: TabId::new(id),
            history: vec![TabPage::new(format!("itch://{}", id))],
            current_index: 0,
            saved_label: None,
            sleepy: None,
        }
    }

    fn snapshot(current: &str, ids: &[&str]) -> Snapshot {
        Snapshot {
            current: TabId::new(current),
            items: ids.iter().map(|id| item(id)).collect(),
        }
    }

    struct Harness {
        bus: NavBus,
        data: MemoryProfileData,
        _service: RestoreService,
    }

    async fn harness(enable_tabs: bool) -> anyhow::Result<Harness> {
        let bus = NavBus::default();
        let data = MemoryProfileData::new();
        bus.store_resource(SnapshotStore::new(data.clone()));

        let mut tx_preferences = bus.tx::<Preferences>()?;
        tx_preferences.send(Preferences { enable_tabs }).await?;

        let _service = RestoreService::spawn(&bus)?;
        Ok(Harness {
            bus,
            data,
            _service,
        })
    }

    async fn store(data: &MemoryProfileData, value: &str) -> anyhow::Result<()> {
        data.put(ProfileId(1), TABS_KEY, value.to_string()).await
    }

    #[test]
    fn validate_truncates() {
        let validated = validate(snapshot("a", &["a", "b", "c"]), false).unwrap();
        assert_eq!(snapshot("a", &["a"]), validated);

        let validated = validate(snapshot("b", &["a", "b", "c"]), true).unwrap();
        assert_eq!(3, validated.items.len());
    }

    #[test]
    fn validate_dangling() {
        let result = validate(snapshot("x", &["y"]), true);
        assert!(matches!(result, Err(RestoreError::DanglingCurrentTab(ref tab)) if tab.as_str() == "x"));

        // the current tab is dropped with the rest
        let result = validate(snapshot("b", &["a", "b"]), false);
        assert!(matches!(result, Err(RestoreError::DanglingCurrentTab(_))));
    }

    #[tokio::test]
    async fn restores() -> anyhow::Result<()> {
        let harness = harness(true).await?;
        let saved = snapshot("b", &["a", "b"]);
        store(&harness.data, saved.encode()?.as_str()).await?;

        let mut tx = harness.bus.tx::<ProfileRecv>()?;
        let mut rx_restored = harness.bus.rx::<TabsRestored>()?;
        let mut rx_finished = harness.bus.rx::<RestoreFinished>()?;
        let mut rx_profile = harness.bus.rx::<Option<Profile>>()?;

        tx.send(ProfileRecv::Loaded(Profile::new(1, "amos"))).await?;

        assert_completes!(async move {
            assert_eq!(Some(TabsRestored(saved)), rx_restored.recv().await);
            assert_eq!(
                Some(RestoreFinished {
                    profile: ProfileId(1),
                    current: Some(TabId::new("b"))
                }),
                rx_finished.recv().await
            );

            let profile = crate::utils::await_state(&mut rx_profile).await.unwrap();
            assert_eq!(ProfileId(1), profile.id);
        });

        Ok(())
    }

    #[tokio::test]
    async fn tabs_disabled_restores_first() -> anyhow::Result<()> {
        let harness = harness(false).await?;
        store(&harness.data, snapshot("a", &["a", "b", "c"]).encode()?.as_str()).await?;

        let mut tx = harness.bus.tx::<ProfileRecv>()?;
        let mut rx_restored = harness.bus.rx::<TabsRestored>()?;

        tx.send(ProfileRecv::Loaded(Profile::new(1, "amos"))).await?;

        assert_completes!(async move {
            let restored = rx_restored.recv().await.unwrap();
            assert_eq!(vec![TabId::new("a")], restored.0.ids());
        });

        Ok(())
    }

    #[tokio::test]
    async fn dangling_current_is_dropped() -> anyhow::Result<()> {
        let harness = harness(true).await?;
        store(&harness.data, snapshot("x", &["y"]).encode()?.as_str()).await?;

        let mut tx = harness.bus.tx::<ProfileRecv>()?;
        let mut rx_restored = harness.bus.rx::<TabsRestored>()?;
        let mut rx_finished = harness.bus.rx::<RestoreFinished>()?;

        tx.send(ProfileRecv::Loaded(Profile::new(1, "amos"))).await?;

        assert_completes!(async {
            let finished = rx_finished.recv().await.unwrap();
            assert_eq!(None, finished.current);
        });

        assert_times_out!(async {
            rx_restored.recv().await;
        });

        Ok(())
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_dropped() -> anyhow::Result<()> {
        let harness = harness(true).await?;
        store(&harness.data, "this is not json").await?;

        let mut tx = harness.bus.tx::<ProfileRecv>()?;
        let mut rx_restored = harness.bus.rx::<TabsRestored>()?;
        let mut rx_finished = harness.bus.rx::<RestoreFinished>()?;

        tx.send(ProfileRecv::Loaded(Profile::new(1, "amos"))).await?;

        assert_completes!(async {
            let finished = rx_finished.recv().await.unwrap();
            assert_eq!(None, finished.current);
        });

        assert_times_out!(async {
            rx_restored.recv().await;
        });

        Ok(())
    }

    #[tokio::test]
    async fn missing_snapshot_finishes() -> anyhow::Result<()> {
        let harness = harness(true).await?;

        let mut tx = harness.bus.tx::<ProfileRecv>()?;
        let mut rx_finished = harness.bus.rx::<RestoreFinished>()?;

        tx.send(ProfileRecv::Loaded(Profile::new(7, "leafo"))).await?;

        assert_completes!(async move {
            assert_eq!(
                Some(RestoreFinished {
                    profile: ProfileId(7),
                    current: None
                }),
                rx_finished.recv().await
            );
        });

        Ok(())
    }

    #[tokio::test]
    async fn logout_clears_profile() -> anyhow::Result<()> {
        let harness = harness(true).await?;

        let mut tx = harness.bus.tx::<ProfileRecv>()?;
        let mut rx_finished = harness.bus.rx::<RestoreFinished>()?;
        let rx_profile = harness.bus.rx::<Option<Profile>>()?;

        tx.send(ProfileRecv::Loaded(Profile::new(1, "amos"))).await?;
        assert_completes!(async {
            rx_finished.recv().await;
        });
        assert!(rx_profile.borrow().is_some());

        tx.send(ProfileRecv::LoggedOut).await?;
        assert_completes!(async {
            loop {
                if rx_profile.borrow().is_none() {
                    break;
                }

                tokio::task::yield_now().await;
            }
        });

        Ok(())
    }
}
