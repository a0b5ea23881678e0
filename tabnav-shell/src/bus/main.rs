use crate::{
    message::main::{MainRecv, MainShutdown},
    prelude::*,
    state::navigation::NavigationState,
    store::SnapshotStore,
};
use postage::{mpsc, watch};
use tabnav_api::config::Config;

lifeline_bus!(pub struct MainBus);

impl Message<MainBus> for MainRecv {
    type Channel = mpsc::Sender<Self>;
}

impl Message<MainBus> for MainShutdown {
    type Channel = mpsc::Sender<Self>;
}

/// Carried from the `NavBus`, so the cli can observe the open tabs
impl Message<MainBus> for Option<NavigationState> {
    type Channel = watch::Sender<Self>;
}

impl Resource<MainBus> for Config {}
impl Resource<MainBus> for SnapshotStore {}
