use crate::{
    message::{
        profile::{ProfileRecv, RestoreFinished, TabsRestored},
        snapshot::{SnapshotFlushed, SnapshotRecv},
        tabs::{TabsChanged, TabsRecv},
        view::{ViewCommand, ViewEvent},
    },
    prelude::*,
    state::{navigation::NavigationState, preferences::Preferences},
    store::SnapshotStore,
};
use lifeline::dyn_bus::DynBus;
use postage::{mpsc, watch};
use tabnav_api::{config::Config, profile::Profile};

lifeline_bus!(pub struct NavBus);

// Tabs & views
impl Message<NavBus> for TabsRecv {
    type Channel = mpsc::Sender<Self>;
}

impl Message<NavBus> for ViewEvent {
    type Channel = mpsc::Sender<Self>;
}

impl Message<NavBus> for ViewCommand {
    type Channel = mpsc::Sender<Self>;
}

impl Message<NavBus> for TabsChanged {
    type Channel = mpsc::Sender<Self>;
}

/// Published by the `NavigationService` after every handled message
impl Message<NavBus> for Option<NavigationState> {
    type Channel = watch::Sender<Self>;
}

// Persistence
impl Message<NavBus> for SnapshotRecv {
    type Channel = mpsc::Sender<Self>;
}

impl Message<NavBus> for SnapshotFlushed {
    type Channel = mpsc::Sender<Self>;
}

// Profile & restore
impl Message<NavBus> for ProfileRecv {
    type Channel = mpsc::Sender<Self>;
}

impl Message<NavBus> for Option<Profile> {
    type Channel = watch::Sender<Self>;
}

impl Message<NavBus> for TabsRestored {
    type Channel = mpsc::Sender<Self>;
}

impl Message<NavBus> for RestoreFinished {
    type Channel = mpsc::Sender<Self>;
}

impl Message<NavBus> for Preferences {
    type Channel = watch::Sender<Self>;
}

impl Resource<NavBus> for Config {}
impl Resource<NavBus> for SnapshotStore {}

pub struct MainNavCarrier {
    _forward_state: Lifeline,
}

impl CarryFrom<MainBus> for NavBus {
    type Lifeline = anyhow::Result<MainNavCarrier>;

    fn carry_from(&self, from: &MainBus) -> Self::Lifeline {
        let config = from.resource::<Config>()?;
        let store = from.resource::<SnapshotStore>()?;

        // preferences are read with borrow(), so the seeded value outlives the sender
        let mut tx_preferences = self.tx::<Preferences>()?;
        tx_preferences
            .try_send(Preferences::from(&config))
            .map_err(|_| anyhow::Error::msg("preferences channel closed"))?;

        self.store_resource(config);
        self.store_resource(store);

        let _forward_state = {
            let mut rx = self.rx::<Option<NavigationState>>()?;
            let mut tx = from.tx::<Option<NavigationState>>()?;
            Self::task("forward_state", async move {
                while let Some(state) = rx.recv().await {
                    // the main bus may have no observers
                    if tx.send(state).await.is_err() {
                        break;
                    }
                }
            })
        };

        Ok(MainNavCarrier { _forward_state })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        prelude::*,
        state::{navigation::NavigationState, preferences::Preferences},
        store::SnapshotStore,
    };
    use lifeline::{assert_completes, dyn_bus::DynBus};
    use tabnav_api::{config::Config, profile::MemoryProfileData};

    fn main_bus(config: Config) -> MainBus {
        let bus = MainBus::default();
        bus.store_resource(config);
        bus.store_resource(SnapshotStore::new(MemoryProfileData::new()));
        bus
    }

    #[tokio::test]
    async fn carries_state() -> anyhow::Result<()> {
        let main = main_bus(Config::default());
        let nav = NavBus::default();
        let _carrier = nav.carry_from(&main)?;

        let mut tx = nav.tx::<Option<NavigationState>>()?;
        let mut rx = main.rx::<Option<NavigationState>>()?;

        let mut state = NavigationState::default();
        state.open.push("a".into());
        tx.send(Some(state.clone())).await?;

        assert_completes!(async move {
            loop {
                let received = rx.recv().await.unwrap();
                if received.as_ref() == Some(&state) {
                    break;
                }
            }
        });

        Ok(())
    }

    #[tokio::test]
    async fn seeds_preferences() -> anyhow::Result<()> {
        let mut config = Config::default();
        config.tabs.enabled = false;

        let main = main_bus(config);
        let nav = NavBus::default();
        let _carrier = nav.carry_from(&main)?;

        let rx = nav.rx::<Preferences>()?;
        assert!(!rx.borrow().enable_tabs);
        assert!(nav.resource::<SnapshotStore>().is_ok());

        Ok(())
    }
}
