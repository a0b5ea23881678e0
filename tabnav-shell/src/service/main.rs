use super::{
    navigation::NavigationService, restore::RestoreService, snapshot::SnapshotService,
    view::HeadlessViewService,
};
use crate::{
    message::{
        main::{MainRecv, MainShutdown},
        profile::{ProfileRecv, RestoreFinished},
        snapshot::{SnapshotFlushed, SnapshotRecv},
        tabs::{OpenTab, TabsChanged, TabsRecv},
        view::{ViewCommand, ViewEvent},
    },
    prelude::*,
    state::navigation::NavigationState,
    utils::{await_condition, await_state},
};
use anyhow::Context;
use postage::watch;
use std::collections::HashSet;
use tabnav_api::{profile::Profile, tab::TabId};

/// Launches the navigation services, and runs cli commands against them in order.
pub struct MainService {
    _main: Lifeline,
    _main_nav: MainNavCarrier,
    _navigation: NavigationService,
    _snapshot: SnapshotService,
    _restore: RestoreService,
    _view: HeadlessViewService,
}

impl Service for MainService {
    type Bus = MainBus;
    type Lifeline = anyhow::Result<Self>;

    fn spawn(main_bus: &Self::Bus) -> Self::Lifeline {
        let nav_bus = NavBus::default();
        nav_bus.capacity::<ViewCommand>(256)?;
        nav_bus.capacity::<ViewEvent>(256)?;
        nav_bus.capacity::<TabsChanged>(64)?;

        let _main_nav = nav_bus.carry_from(main_bus)?;

        let _navigation = NavigationService::spawn(&nav_bus)?;
        let _snapshot = SnapshotService::spawn(&nav_bus)?;
        let _restore = RestoreService::spawn(&nav_bus)?;
        let _view = HeadlessViewService::spawn(&nav_bus)?;

        let commands = MainCommands {
            tx_tabs: nav_bus.tx::<TabsRecv>()?,
            tx_profile: nav_bus.tx::<ProfileRecv>()?,
            tx_snapshot: nav_bus.tx::<SnapshotRecv>()?,
            rx_flushed: nav_bus.rx::<SnapshotFlushed>()?,
            rx_finished: nav_bus.rx::<RestoreFinished>()?,
            rx_state: nav_bus.rx::<Option<NavigationState>>()?,
            _nav_bus: nav_bus,
        };

        let rx_main = main_bus.rx::<MainRecv>()?;
        let tx_shutdown = main_bus.tx::<MainShutdown>()?;
        let _main = Self::try_task("main_recv", commands.run(rx_main, tx_shutdown));

        Ok(Self {
            _main,
            _main_nav,
            _navigation,
            _snapshot,
            _restore,
            _view,
        })
    }
}

struct MainCommands<Tabs, Profiles, Snapshots, Flushed, Finished> {
    tx_tabs: Tabs,
    tx_profile: Profiles,
    tx_snapshot: Snapshots,
    rx_flushed: Flushed,
    rx_finished: Finished,
    rx_state: watch::Receiver<Option<NavigationState>>,
    _nav_bus: NavBus,
}

impl<Tabs, Profiles, Snapshots, Flushed, Finished>
    MainCommands<Tabs, Profiles, Snapshots, Flushed, Finished>
where
    Tabs: Sink<Item = TabsRecv> + Unpin,
    Profiles: Sink<Item = ProfileRecv> + Unpin,
    Snapshots: Sink<Item = SnapshotRecv> + Unpin,
    Flushed: Stream<Item = SnapshotFlushed> + Unpin,
    Finished: Stream<Item = RestoreFinished> + Unpin,
{
    async fn run(
        mut self,
        mut rx: impl Stream<Item = MainRecv> + Unpin,
        mut tx_shutdown: impl Sink<Item = MainShutdown> + Unpin,
    ) -> anyhow::Result<()> {
        while let Some(msg) = rx.recv().await {
            debug!("MainRecv: {:?}", &msg);

            match msg {
                MainRecv::LoadProfile(profile) => self.load_profile(profile).await?,
                MainRecv::OpenTabs(urls) => self.open_tabs(urls).await?,
                MainRecv::ListTabs => {
                    let state = await_state(&mut self.rx_state).await?;
                    for line in echo_tabs(&state) {
                        println!("{}", line);
                    }
                }
                MainRecv::Shutdown => {
                    self.tx_snapshot
                        .send(SnapshotRecv::Flush)
                        .await
                        .context("tx SnapshotRecv::Flush")?;
                    self.rx_flushed.recv().await;

                    tx_shutdown.send(MainShutdown(0)).await.ok();
                    break;
                }
            }
        }

        Ok(())
    }

    async fn load_profile(&mut self, profile: Profile) -> anyhow::Result<()> {
        let id = profile.id;
        self.tx_profile
            .send(ProfileRecv::Loaded(profile))
            .await
            .context("tx ProfileRecv::Loaded")?;

        while let Some(finished) = self.rx_finished.recv().await {
            if finished.profile != id {
                continue;
            }

            if let Some(current) = finished.current {
                // the restore is applied once the current tab is published
                await_condition(&mut self.rx_state, |state: &NavigationState| {
                    state.current.as_ref() == Some(&current)
                })
                .await?;
            }

            break;
        }

        Ok(())
    }

    async fn open_tabs(&mut self, urls: Vec<String>) -> anyhow::Result<()> {
        let mut ids = Vec::with_capacity(urls.len());
        for url in urls {
            let open = OpenTab::new(url);
            ids.push(open.id.clone());
            self.tx_tabs
                .send(TabsRecv::Open(open))
                .await
                .context("tx TabsRecv::Open")?;
        }

        await_condition(&mut self.rx_state, |state: &NavigationState| {
            let open: HashSet<&TabId> = state.open.iter().collect();
            ids.iter().all(|id| open.contains(id))
        })
        .await?;

        Ok(())
    }
}

/// Formats the open tabs for the terminal.  The current tab is marked with `*`.
fn echo_tabs(state: &NavigationState) -> Vec<String> {
    if state.open.is_empty() {
        return vec!["No open tabs.".to_string()];
    }

    let width = state.open.iter().map(|id| id.as_str().len()).max().unwrap_or(0) + 4;

    let mut lines = vec!["Open tabs:".to_string()];
    for id in state.open.iter() {
        let marker = if state.current.as_ref() == Some(id) {
            "*"
        } else {
            " "
        };

        let label = state
            .instances
            .get(id)
            .and_then(|instance| instance.label())
            .unwrap_or_default();

        lines.push(format!("  {} {:width$}{}", marker, id.as_str(), label, width = width));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::{echo_tabs, MainService};
    use crate::{
        message::{
            main::{MainRecv, MainShutdown},
            tabs::OpenTab,
        },
        prelude::*,
        state::navigation::NavigationState,
        store::SnapshotStore,
        utils::await_condition,
    };
    use lifeline::{assert_completes, dyn_bus::DynBus};
    use tabnav_api::{
        config::Config,
        profile::{MemoryProfileData, Profile, ProfileId},
        tab::TabId,
    };

    fn bus(data: &MemoryProfileData) -> MainBus {
        let bus = MainBus::default();
        bus.store_resource(Config::default());
        bus.store_resource(SnapshotStore::new(data.clone()));
        bus
    }

    #[test]
    fn echo_marks_current() {
        let mut state = NavigationState::default();
        state.open_tab(&OpenTab {
            id: TabId::new("a"),
            url: Some("https://itch.io".into()),
            background: false,
        });
        state.open_tab(&OpenTab {
            id: TabId::new("bb"),
            url: Some("itch://library".into()),
            background: true,
        });

        assert_eq!(
            vec![
                "Open tabs:".to_string(),
                "  * a     https://itch.io".to_string(),
                "    bb    itch://library".to_string(),
            ],
            echo_tabs(&state)
        );

        assert_eq!(
            vec!["No open tabs.".to_string()],
            echo_tabs(&NavigationState::default())
        );
    }

    #[tokio::test]
    async fn shutdown_flushes() -> anyhow::Result<()> {
        let data = MemoryProfileData::new();
        let bus = bus(&data);
        let _service = MainService::spawn(&bus)?;

        let mut tx = bus.tx::<MainRecv>()?;
        let mut rx_shutdown = bus.rx::<MainShutdown>()?;
        let mut rx_state = bus.rx::<Option<NavigationState>>()?;

        tx.send(MainRecv::LoadProfile(Profile::new(1, "amos"))).await?;
        tx.send(MainRecv::OpenTabs(vec!["https://itch.io".into()])).await?;
        tx.send(MainRecv::Shutdown).await?;

        assert_completes!(async move {
            assert_eq!(Some(MainShutdown(0)), rx_shutdown.recv().await);
        });

        assert_eq!(1, data.writes());

        let state = await_condition(&mut rx_state, |state: &NavigationState| {
            state.open.len() == 1
        })
        .await?;
        let snapshot = SnapshotStore::new(data).load(ProfileId(1)).await?;
        assert_eq!(state.open, snapshot.ids());

        Ok(())
    }

    #[tokio::test]
    async fn burst_of_opens_shuts_down() -> anyhow::Result<()> {
        let data = MemoryProfileData::new();
        let bus = bus(&data);
        let _service = MainService::spawn(&bus)?;

        let mut tx = bus.tx::<MainRecv>()?;
        let mut rx_shutdown = bus.rx::<MainShutdown>()?;

        let urls = (0..500).map(|i| format!("https://itch.io/{}", i)).collect();
        tx.send(MainRecv::LoadProfile(Profile::new(1, "amos"))).await?;
        tx.send(MainRecv::OpenTabs(urls)).await?;
        tx.send(MainRecv::Shutdown).await?;

        assert_completes!(
            async move {
                assert_eq!(Some(MainShutdown(0)), rx_shutdown.recv().await);
            },
            10000
        );

        let snapshot = SnapshotStore::new(data).load(ProfileId(1)).await?;
        assert_eq!(500, snapshot.items.len());
        assert_eq!(snapshot.items[499].id, snapshot.current);

        Ok(())
    }
}
