use crate::{
    message::{
        snapshot::{SnapshotFlushed, SnapshotRecv},
        tabs::TabsChanged,
    },
    prelude::*,
    state::navigation::NavigationState,
    store::SnapshotStore,
    utils::Debounce,
};
use postage::watch;
use tabnav_api::{config::Config, profile::Profile};
use tokio::select;

/// Saves the open tabs once `TabsChanged` has been quiet for the autosave threshold.
///
/// A burst of changes produces one write.  `SnapshotRecv::Flush` writes immediately.
pub struct SnapshotService {
    _autosave: Lifeline,
}

impl Service for SnapshotService {
    type Bus = NavBus;
    type Lifeline = anyhow::Result<Self>;

    fn spawn(bus: &Self::Bus) -> Self::Lifeline {
        let config = bus.resource::<Config>()?;
        let store = bus.resource::<SnapshotStore>()?;

        let rx_changed = bus.rx::<TabsChanged>()?;
        let rx_recv = bus.rx::<SnapshotRecv>()?;
        let rx_state = bus.rx::<Option<NavigationState>>()?;
        let rx_profile = bus.rx::<Option<Profile>>()?;
        let tx_flushed = bus.tx::<SnapshotFlushed>()?;

        let autosave = Autosave {
            store,
            rx_state,
            rx_profile,
        };

        let _autosave = Self::try_task(
            "autosave",
            autosave.run(
                Debounce::new(config.autosave.threshold()),
                rx_changed,
                rx_recv,
                tx_flushed,
            ),
        );

        Ok(Self { _autosave })
    }
}

struct Autosave {
    store: SnapshotStore,
    rx_state: watch::Receiver<Option<NavigationState>>,
    rx_profile: watch::Receiver<Option<Profile>>,
}

impl Autosave {
    async fn run(
        self,
        mut debounce: Debounce,
        mut rx_changed: impl Stream<Item = TabsChanged> + Unpin,
        mut rx_recv: impl Stream<Item = SnapshotRecv> + Unpin,
        mut tx_flushed: impl Sink<Item = SnapshotFlushed> + Unpin,
    ) -> anyhow::Result<()> {
        loop {
            let deadline = debounce.deadline();

            // changes queued before a flush are covered by it
            select! {
                biased;
                changed = rx_changed.recv() => {
                    if changed.is_none() {
                        break;
                    }

                    debounce.touch();
                },
                recv = rx_recv.recv() => match recv {
                    Some(SnapshotRecv::Flush) => {
                        debug!("flushing tabs snapshot");
                        debounce.cancel();
                        self.save().await;
                        tx_flushed.send(SnapshotFlushed).await?;
                    },
                    None => break
                },
                _ = Debounce::elapsed(deadline) => {
                    debounce.cancel();
                    self.save().await;
                }
            }
        }

        if debounce.is_pending() {
            self.save().await;
        }

        Ok(())
    }

    /// Writes the latest state.  Failures are logged, and the next change retries.
    async fn save(&self) {
        let profile = (*self.rx_profile.borrow()).as_ref().map(|profile| profile.id);
        let state: Option<NavigationState> = (*self.rx_state.borrow()).clone();

        let state = match state {
            Some(state) => state,
            None => {
                debug!("navigation state not yet published, skipping save");
                return;
            }
        };

        if let Err(e) = self.store.save(profile, &state).await {
            warn!("failed to save tabs: {}", e);
        }
    }
}
