use crate::{
    message::{
        profile::TabsRestored,
        tabs::{TabsChanged, TabsRecv},
        view::{ViewCommand, ViewEvent},
    },
    prelude::*,
    state::{
        binding::{Reconciled, Reconciler},
        navigation::NavigationState,
    },
};
use tabnav_api::config::Config;
use tokio::select;

/// Owns the tab registry and the view bindings.
/// All tab mutation happens in this task, in the order messages are received.
pub struct NavigationService {
    _run: Lifeline,
}

impl Service for NavigationService {
    type Bus = NavBus;
    type Lifeline = anyhow::Result<Self>;

    fn spawn(bus: &Self::Bus) -> Self::Lifeline {
        let config = bus.resource::<Config>()?;
        let reconciler = Reconciler::new(config.internal_scheme.as_str());

        let rx_restored = bus.rx::<TabsRestored>()?;
        let rx_tabs = bus.rx::<TabsRecv>()?;
        let rx_events = bus.rx::<ViewEvent>()?;

        let tx_commands = bus.tx::<ViewCommand>()?;
        let tx_changed = bus.tx::<TabsChanged>()?;
        let tx_state = bus.tx::<Option<NavigationState>>()?;

        let _run = Self::try_task(
            "run",
            Self::run(
                reconciler,
                rx_restored,
                rx_tabs,
                rx_events,
                tx_commands,
                tx_changed,
                tx_state,
            ),
        );

        Ok(Self { _run })
    }
}

impl NavigationService {
    async fn run(
        reconciler: Reconciler,
        mut rx_restored: impl Stream<Item = TabsRestored> + Unpin,
        mut rx_tabs: impl Stream<Item = TabsRecv> + Unpin,
        mut rx_events: impl Stream<Item = ViewEvent> + Unpin,
        mut tx_commands: impl Sink<Item = ViewCommand> + Unpin,
        mut tx_changed: impl Sink<Item = TabsChanged> + Unpin,
        mut tx_state: impl Sink<Item = Option<NavigationState>> + Unpin,
    ) -> anyhow::Result<()> {
        let mut state = NavigationState::default();
        tx_state.send(Some(state.clone())).await?;

        loop {
            // restores apply before any later tab command, and view events drain before new commands
            let reconciled = select! {
                biased;
                Some(TabsRestored(snapshot)) = rx_restored.recv() => {
                    info!("restoring {} tabs", snapshot.items.len());
                    let commands = reconciler.unbind_all(&mut state);
                    state.restore(snapshot);

                    Reconciled { commands, changed: false }
                },
                Some(event) = rx_events.recv() => {
                    trace!("ViewEvent: {:?}", &event);
                    reconciler.handle(&mut state, event)
                },
                Some(recv) = rx_tabs.recv() => {
                    debug!("TabsRecv: {:?}", &recv);
                    Self::tabs_recv(&reconciler, &mut state, recv)
                },
                else => break
            };

            let mut commands = reconciled.commands;
            commands.extend(reconciler.reconcile(&mut state));

            for command in commands {
                tx_commands.send(command).await?;
            }

            tx_state.send(Some(state.clone())).await?;

            if reconciled.changed {
                tx_changed.send(TabsChanged).await?;
            }
        }

        Ok(())
    }

    fn tabs_recv(reconciler: &Reconciler, state: &mut NavigationState, recv: TabsRecv) -> Reconciled {
        let changed = match recv {
            TabsRecv::Open(open) => {
                let current = state.current.clone();
                state.open_tab(&open) || state.current != current
            }
            TabsRecv::Close(id) => state.close_tab(&id),
            TabsRecv::Focus(id) => {
                let current = state.current.clone();
                state.focus(&id) && state.current != current
            }
            TabsRecv::Navigate { tab, url } => return reconciler.load_url(state, &tab, url),
            TabsRecv::GoBack(tab) => return reconciler.go_back(state, &tab),
            TabsRecv::GoForward(tab) => return reconciler.go_forward(state, &tab),
        };

        Reconciled {
            commands: vec![],
            changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NavigationService;
    use crate::{
        message::{
            profile::TabsRestored,
            tabs::{OpenTab, TabsChanged, TabsRecv},
            view::{NavigationBuffer, ViewAction, ViewCommand, ViewEvent, ViewEventKind},
        },
        prelude::*,
        state::navigation::NavigationState,
        utils::await_condition,
    };
    use lifeline::{assert_completes, assert_times_out, dyn_bus::DynBus};
    use pretty_assertions::assert_eq;
    use tabnav_api::{
        config::Config,
        snapshot::Snapshot,
        tab::{TabDataSave, TabId, TabPage},
    };

    fn bus() -> NavBus {
        let bus = NavBus::default();
        bus.store_resource(Config::default());
        bus
    }

    fn open(id: &str, url: &str) -> TabsRecv {
        TabsRecv::Open(OpenTab {
            id: TabId::new(id),
            url: Some(url.to_string()),
            background: false,
        })
    }

    #[tokio::test]
    async fn open_creates_view() -> anyhow::Result<()> {
        let bus = bus();
        let _service = NavigationService::spawn(&bus)?;

        let mut tx = bus.tx::<TabsRecv>()?;
        let mut rx_commands = bus.rx::<ViewCommand>()?;
        let mut rx_changed = bus.rx::<TabsChanged>()?;

        tx.send(open("a", "https://itch.io")).await?;

        assert_completes!(async move {
            let command = rx_commands.recv().await.unwrap();
            assert_eq!(TabId::new("a"), command.tab);
            assert_eq!(
                ViewAction::Create {
                    url: "about:blank".into()
                },
                command.action
            );

            assert_eq!(Some(TabsChanged), rx_changed.recv().await);
        });

        Ok(())
    }

    #[tokio::test]
    async fn view_navigation_updates_state() -> anyhow::Result<()> {
        let bus = bus();
        let _service = NavigationService::spawn(&bus)?;

        let mut tx = bus.tx::<TabsRecv>()?;
        let mut tx_events = bus.tx::<ViewEvent>()?;
        let mut rx_commands = bus.rx::<ViewCommand>()?;
        let mut rx_state = bus.rx::<Option<NavigationState>>()?;

        tx.send(open("a", "https://itch.io")).await?;
        let create = rx_commands.recv().await.unwrap();

        let buffer = NavigationBuffer::new(
            vec![TabPage::new("https://itch.io"), TabPage::new("https://itch.io/games")],
            1,
        );
        tx_events
            .send(ViewEvent::new(
                create.tab.clone(),
                create.view,
                ViewEventKind::DidNavigate {
                    url: "https://itch.io/games".into(),
                    buffer,
                },
            ))
            .await?;

        assert_completes!(async move {
            let state = await_condition(&mut rx_state, |state: &NavigationState| {
                state
                    .current_instance()
                    .map(|instance| instance.current_index == 1)
                    .unwrap_or(false)
            })
            .await
            .unwrap();

            assert_eq!(2, state.current_instance().unwrap().history.len());
        });

        Ok(())
    }

    #[tokio::test]
    async fn restore_replaces_tabs() -> anyhow::Result<()> {
        let bus = bus();
        let _service = NavigationService::spawn(&bus)?;

        let mut tx = bus.tx::<TabsRecv>()?;
        let mut tx_restored = bus.tx::<TabsRestored>()?;
        let mut rx_commands = bus.rx::<ViewCommand>()?;
        let mut rx_state = bus.rx::<Option<NavigationState>>()?;

        tx.send(open("old", "https://old")).await?;
        let create = rx_commands.recv().await.unwrap();

        let snapshot = Snapshot {
            current: TabId::new("b"),
            items: vec![
                TabDataSave {
                    id: TabId::new("a"),
                    history: vec![TabPage::new("1")],
                    current_index: 0,
                    saved_label: None,
                    sleepy: None,
                },
                TabDataSave {
                    id: TabId::new("b"),
                    history: vec![TabPage::new("2"), TabPage::new("3")],
                    current_index: 1,
                    saved_label: None,
                    sleepy: None,
                },
            ],
        };
        tx_restored.send(TabsRestored(snapshot)).await?;

        assert_completes!(async move {
            let destroy = rx_commands.recv().await.unwrap();
            assert_eq!(ViewCommand::new(create.tab, create.view, ViewAction::Destroy), destroy);

            let create_b = rx_commands.recv().await.unwrap();
            assert_eq!(TabId::new("b"), create_b.tab);

            let state = await_condition(&mut rx_state, |state: &NavigationState| {
                state.current == Some(TabId::new("b"))
            })
            .await
            .unwrap();

            assert_eq!(vec![TabId::new("a"), TabId::new("b")], state.open);
            assert!(state.instances.get(&TabId::new("a")).unwrap().sleepy);
            assert_eq!(1, state.views.len());
        });

        Ok(())
    }

    #[tokio::test]
    async fn focus_current_is_unchanged() -> anyhow::Result<()> {
        let bus = bus();
        let _service = NavigationService::spawn(&bus)?;

        let mut tx = bus.tx::<TabsRecv>()?;
        let mut rx_changed = bus.rx::<TabsChanged>()?;
        let _rx_commands = bus.rx::<ViewCommand>()?;

        tx.send(open("a", "https://itch.io")).await?;
        assert_completes!(async {
            rx_changed.recv().await;
        });

        tx.send(TabsRecv::Focus(TabId::new("a"))).await?;
        assert_times_out!(async {
            rx_changed.recv().await;
        });

        Ok(())
    }
}
